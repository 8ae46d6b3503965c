//! Hash-prefix URL reputation engine
//!
//! This crate turns arbitrary URL strings into canonical form, expands each
//! into the host/path permutations a reputation list may hold, hashes them,
//! and reconciles batched prefix lookups back to the URLs that produced them.
//!
//! # Architecture
//!
//! Nothing here touches the network. A lookup backend plugs in through the
//! [`LookupService`] trait; the [`BatchCoordinator`] drives it one batch at a
//! time and owns the [`HashIndex`] for the duration of a run.
//!
//! # Modules
//!
//! - `escape`: byte-level percent decoding and re-encoding
//! - `url`: structural URL splitting without allocations
//! - `canonical`: URL canonicalization
//! - `permutation`: host/path permutation generation
//! - `hash`: SHA-256 digests, prefixes and their base64 form
//! - `index`: digest → source URL bookkeeping
//! - `protocol`: lookup wire format and the service trait
//! - `coordinator`: batching, reconciliation and residual reporting
//! - `types`: output record types

pub mod canonical;
pub mod coordinator;
pub mod escape;
pub mod hash;
pub mod index;
pub mod permutation;
pub mod protocol;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use canonical::{canonicalize, CanonicalUrl, CanonicalizeError};
pub use coordinator::{
    BatchCoordinator, CoordinatorConfig, CoordinatorError, CoordinatorState, CoordinatorStats,
    FailurePolicy,
};
pub use hash::{Digest, Prefix};
pub use index::HashIndex;
pub use permutation::permutations;
pub use protocol::{ClientConfig, LookupError, LookupService};
pub use types::{MatchRecord, ThreatSubtype};
