//! # Shared Types Crate
//!
//! Cross-subsystem primitives for the Sovereign-Net consensus core.
//!
//! ## Design Principles
//!
//! - **One hashing algorithm**: every immutable record is content-addressed
//!   with SHA-256 over sorted-key, whitespace-free JSON. Other
//!   implementations recompute these hashes, so the algorithm lives in one
//!   place ([`hashing`]).
//! - **Explicit audit sink**: components never keep a private event list;
//!   they are handed an [`AuditSink`] and push `{timestamp, event_type, data}`
//!   tuples into it.
//! - **Injected clock**: wall-clock reads go through [`TimeSource`] so that
//!   round timeouts and id derivation are deterministic under test.

pub mod audit;
pub mod errors;
pub mod hashing;
pub mod ids;
pub mod time;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, NullAuditSink, TracingAuditSink};
pub use errors::*;
pub use hashing::{
    canonical_hash, canonical_json, content_hash, verify_record, CanonicalRecord, ContentHash,
};
pub use ids::{SiteId, ValidatorId};
pub use time::{iso8601, ManualClock, SystemTimeSource, TimeSource};
