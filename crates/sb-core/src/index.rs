//! Digest → (source URL, prefix) index for one run
//!
//! Entries are inserted as permutations are hashed and removed at most once,
//! when a lookup response claims them. Whatever is left at the end of the run
//! is reported as residual.

use std::collections::HashMap;

use crate::hash::{Digest, Prefix};

/// What the index remembers about a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Source URL that produced the permutation
    pub url: String,
    /// Permutation expression that was hashed
    pub permutation: String,
    pub prefix: Prefix,
}

/// Result of [`HashIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Digest was new and is now tracked
    Inserted(Digest),
    /// Digest was already tracked; the existing entry was kept
    Existing(Digest),
}

impl Insertion {
    pub fn digest(&self) -> Digest {
        match *self {
            Self::Inserted(digest) | Self::Existing(digest) => digest,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Owner of the URL ↔ hash association for one run.
#[derive(Debug, Default)]
pub struct HashIndex {
    entries: HashMap<Digest, (u64, IndexEntry)>,
    next_seq: u64,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a permutation and record it against its source URL.
    ///
    /// A digest that is already tracked keeps its first source URL.
    pub fn insert(&mut self, url: &str, permutation: &str) -> Insertion {
        let digest = Digest::of(permutation);
        if self.entries.contains_key(&digest) {
            return Insertion::Existing(digest);
        }

        let entry = IndexEntry {
            url: url.to_string(),
            permutation: permutation.to_string(),
            prefix: digest.prefix(),
        };
        self.entries.insert(digest, (self.next_seq, entry));
        self.next_seq += 1;
        Insertion::Inserted(digest)
    }

    /// Remove and return the entry for a full hash.
    /// A second call for the same digest returns `None`.
    pub fn take_by_full_hash(&mut self, digest: &Digest) -> Option<IndexEntry> {
        self.entries.remove(digest).map(|(_, entry)| entry)
    }

    pub fn get(&self, digest: &Digest) -> Option<&IndexEntry> {
        self.entries.get(digest).map(|(_, entry)| entry)
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.entries.contains_key(digest)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unclaimed entries in insertion order.
    pub fn remaining(&self) -> Vec<(Digest, &IndexEntry)> {
        let mut items: Vec<_> = self
            .entries
            .iter()
            .map(|(digest, (seq, entry))| (*seq, *digest, entry))
            .collect();
        items.sort_unstable_by_key(|(seq, _, _)| *seq);
        items
            .into_iter()
            .map(|(_, digest, entry)| (digest, entry))
            .collect()
    }

    /// Empty the index, returning unclaimed entries in insertion order.
    pub fn drain_remaining(&mut self) -> Vec<(Digest, IndexEntry)> {
        let mut items: Vec<_> = self
            .entries
            .drain()
            .map(|(digest, (seq, entry))| (seq, digest, entry))
            .collect();
        items.sort_unstable_by_key(|(seq, _, _)| *seq);
        items
            .into_iter()
            .map(|(_, digest, entry)| (digest, entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_records_url_and_prefix() {
        let mut index = HashIndex::new();
        let insertion = index.insert("http://google.com/a/b.html", "google.com/a/");
        assert!(insertion.is_new());

        let entry = index.get(&insertion.digest()).unwrap();
        assert_eq!(entry.url, "http://google.com/a/b.html");
        assert_eq!(entry.permutation, "google.com/a/");
        assert_eq!(entry.prefix.to_base64(), "uCjy7Q==");
    }

    #[test]
    fn test_insert_keeps_first_url() {
        let mut index = HashIndex::new();
        let first = index.insert("http://google.com/a", "google.com/");
        let second = index.insert("http://google.com/b", "google.com/");
        assert_eq!(second, Insertion::Existing(first.digest()));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&first.digest()).unwrap().url, "http://google.com/a");
    }

    #[test]
    fn test_take_at_most_once() {
        let mut index = HashIndex::new();
        let digest = index.insert("http://google.com/", "google.com/").digest();

        let taken = index.take_by_full_hash(&digest).unwrap();
        assert_eq!(taken.prefix, digest.prefix());
        assert_eq!(index.take_by_full_hash(&digest), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_take_unknown_digest() {
        let mut index = HashIndex::new();
        index.insert("http://google.com/", "google.com/");
        assert_eq!(index.take_by_full_hash(&Digest::of("evil.example/")), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remaining_in_insertion_order() {
        let mut index = HashIndex::new();
        let perms = ["c.example/", "a.example/", "b.example/", "d.example/"];
        let digests: Vec<Digest> = perms
            .iter()
            .map(|p| index.insert("http://src/", p).digest())
            .collect();

        index.take_by_full_hash(&digests[2]);

        let remaining: Vec<&str> = index
            .remaining()
            .into_iter()
            .map(|(_, entry)| entry.permutation.as_str())
            .collect();
        assert_eq!(remaining, ["c.example/", "a.example/", "d.example/"]);

        let drained: Vec<Digest> = index.drain_remaining().into_iter().map(|(d, _)| d).collect();
        assert_eq!(drained, [digests[0], digests[1], digests[3]]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_reinsert_after_take() {
        let mut index = HashIndex::new();
        let digest = index.insert("http://one/", "google.com/").digest();
        index.take_by_full_hash(&digest);
        assert!(index.insert("http://two/", "google.com/").is_new());
        assert_eq!(index.remaining().len(), 1);
    }
}
