//! Batching and reconciliation
//!
//! The coordinator takes raw URLs one at a time, hashes their permutations
//! into a [`HashIndex`], and every `batch_size` submissions sends the pending
//! prefixes to a [`LookupService`]. Matches are reconciled against the index
//! and returned as [`MatchRecord`]s; whatever was never claimed comes back as
//! residual records from [`BatchCoordinator::finish`].
//!
//! Everything runs on the caller's thread. The lookup call is the only
//! blocking point, and batches never overlap.
//!
//! ```text
//! Idle ──submit──▶ Accumulating ──threshold / finish──▶ Flushing ──▶ Accumulating | Done
//! ```

use std::collections::HashSet;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::canonical::canonicalize;
use crate::hash::{decode_base64, encode_base64, Digest, Prefix};
use crate::index::HashIndex;
use crate::permutation::permutations;
use crate::protocol::{ClientConfig, FindFullHashesResponse, LookupError, LookupService};
use crate::types::{MatchRecord, ThreatSubtype};

/// Submissions per lookup batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Error type for the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("coordinator already finished")]
    Finished,
}

/// What to do when a lookup exchange fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the error; the batch stays pending so the caller may flush again.
    #[default]
    Abort,
    /// Log and drop the batch; its hashes surface as residuals at finish.
    SkipBatch,
}

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Submissions between flushes (minimum 1)
    pub batch_size: usize,
    pub failure_policy: FailurePolicy,
    pub client: ClientConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            failure_policy: FailurePolicy::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Accumulating,
    Flushing,
    Done,
}

/// Running totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub submitted: usize,
    pub unresolved: usize,
    pub prefixes_sent: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub matches: usize,
    pub unknown_matches: usize,
    pub residuals: usize,
}

// =============================================================================
// Coordinator
// =============================================================================

pub struct BatchCoordinator<L> {
    service: L,
    config: CoordinatorConfig,
    index: HashIndex,
    batch: Vec<Prefix>,
    /// Best-effort records not yet handed back to the caller
    unreported: Vec<MatchRecord>,
    since_flush: usize,
    state: CoordinatorState,
    stats: CoordinatorStats,
}

impl<L: LookupService> BatchCoordinator<L> {
    pub fn new(service: L, mut config: CoordinatorConfig) -> Self {
        config.batch_size = config.batch_size.max(1);
        Self {
            service,
            config,
            index: HashIndex::new(),
            batch: Vec::new(),
            unreported: Vec::new(),
            since_flush: 0,
            state: CoordinatorState::Idle,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn index(&self) -> &HashIndex {
        &self.index
    }

    /// Prefixes waiting for the next flush, in submission order.
    pub fn pending(&self) -> &[Prefix] {
        &self.batch
    }

    pub fn service(&self) -> &L {
        &self.service
    }

    /// Submit one raw URL.
    ///
    /// Returns the records produced by this call: a best-effort record if the
    /// URL could not be canonicalized, plus any matches from a flush that the
    /// submission triggered. If that flush fails, best-effort records are
    /// held back and returned by the next call that succeeds.
    pub fn submit(&mut self, raw_url: &str) -> Result<Vec<MatchRecord>, CoordinatorError> {
        if self.state == CoordinatorState::Done {
            return Err(CoordinatorError::Finished);
        }
        self.state = CoordinatorState::Accumulating;

        match canonicalize(raw_url) {
            Ok(canonical) => {
                for permutation in permutations(&canonical) {
                    let insertion = self.index.insert(raw_url, &permutation);
                    if insertion.is_new() {
                        self.batch.push(insertion.digest().prefix());
                    } else {
                        debug!("permutation {:?} already tracked", permutation);
                    }
                }
            }
            Err(err) => {
                warn!("{}", err);
                self.stats.unresolved += 1;
                self.unreported
                    .push(MatchRecord::unresolved(raw_url, Utc::now()));
            }
        }

        self.stats.submitted += 1;
        self.since_flush += 1;
        if self.since_flush >= self.config.batch_size {
            return self.flush();
        }
        Ok(std::mem::take(&mut self.unreported))
    }

    /// Send the pending batch and reconcile the response.
    ///
    /// An empty batch performs no exchange. Best-effort records held back
    /// from earlier calls come first in the result.
    pub fn flush(&mut self) -> Result<Vec<MatchRecord>, CoordinatorError> {
        if self.state == CoordinatorState::Done {
            return Err(CoordinatorError::Finished);
        }
        if self.batch.is_empty() {
            self.since_flush = 0;
            return Ok(std::mem::take(&mut self.unreported));
        }

        self.state = CoordinatorState::Flushing;
        info!("sending lookup request for {} prefixes", self.batch.len());
        let request = self.config.client.request(&self.batch);

        let response = match self.service.find_full_hashes(&request) {
            Ok(response) => response,
            Err(err) => {
                self.stats.batches_failed += 1;
                self.state = CoordinatorState::Accumulating;
                match self.config.failure_policy {
                    FailurePolicy::Abort => return Err(err.into()),
                    FailurePolicy::SkipBatch => {
                        error!(
                            "lookup failed, skipping batch of {} prefixes: {}",
                            self.batch.len(),
                            err
                        );
                        self.batch.clear();
                        self.since_flush = 0;
                        return Ok(std::mem::take(&mut self.unreported));
                    }
                }
            }
        };

        self.stats.batches_sent += 1;
        self.stats.prefixes_sent += self.batch.len();
        self.batch.clear();
        self.since_flush = 0;

        let matches = self.reconcile(response);
        info!("batch reconciled: {} match records", matches.len());
        self.state = CoordinatorState::Accumulating;

        let mut records = std::mem::take(&mut self.unreported);
        records.extend(matches);
        Ok(records)
    }

    /// Flush what is pending, then report every unclaimed hash as residual.
    pub fn finish(&mut self) -> Result<Vec<MatchRecord>, CoordinatorError> {
        let mut records = self.flush()?;

        let timestamp = Utc::now();
        for (digest, entry) in self.index.drain_remaining() {
            records.push(MatchRecord::residual(
                entry.url,
                digest.to_base64(),
                entry.prefix.to_base64(),
                timestamp,
            ));
            self.stats.residuals += 1;
        }

        self.state = CoordinatorState::Done;
        Ok(records)
    }

    /// Turn a lookup response into records, claiming index entries.
    fn reconcile(&mut self, response: FindFullHashesResponse) -> Vec<MatchRecord> {
        let timestamp = Utc::now();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut records = Vec::with_capacity(response.matches.len());

        for threat_match in response.matches {
            let reported = threat_match.full_hash();
            let (bytes, full_hash) = match decode_base64(reported) {
                Ok(bytes) => {
                    let full_hash = encode_base64(&bytes);
                    (bytes, full_hash)
                }
                Err(err) => {
                    warn!("undecodable hash {:?} in lookup response: {}", reported, err);
                    (reported.as_bytes().to_vec(), reported.to_string())
                }
            };

            if !seen.insert(bytes.clone()) {
                debug!("duplicate match for {} in one response", full_hash);
                continue;
            }

            let claimed = Digest::try_from(bytes.as_slice())
                .ok()
                .and_then(|digest| self.index.take_by_full_hash(&digest));
            let (url, partial_hash) = match claimed {
                Some(entry) => (entry.url, entry.prefix.to_base64()),
                None => {
                    self.stats.unknown_matches += 1;
                    debug!("match {} was not submitted in this run", full_hash);
                    let prefix = Prefix::from_leading(&bytes)
                        .map(|p| p.to_base64())
                        .unwrap_or_default();
                    (String::new(), prefix)
                }
            };

            self.stats.matches += 1;
            records.push(MatchRecord {
                url,
                full_hash,
                partial_hash,
                timestamp,
                threat_type: threat_match.threat_type.clone().unwrap_or_default(),
                threat_subtype: threat_match
                    .subtype_marker()
                    .and_then(ThreatSubtype::from_metadata_value),
                platform_type: threat_match.platform_type.clone().unwrap_or_default(),
            });
        }

        records
    }
}
