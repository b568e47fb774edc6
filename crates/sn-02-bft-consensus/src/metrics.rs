//! # Consensus Metrics
//!
//! Prometheus counters for round progress.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! sn-02-bft-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bft_rounds_started_total` - Rounds opened, including timeout successors
//! - `bft_blocks_finalized_total` - Blocks reaching FINALIZED
//! - `bft_votes_rejected_total` - Rejected votes (by reason)
//! - `bft_round_timeouts_total` - Rounds replaced after timing out

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ROUNDS_STARTED: IntCounter = register_int_counter!(
        "bft_rounds_started_total",
        "Total number of consensus rounds started"
    )
    .expect("Failed to create ROUNDS_STARTED metric");

    pub static ref BLOCKS_FINALIZED: IntCounter = register_int_counter!(
        "bft_blocks_finalized_total",
        "Total number of blocks finalized"
    )
    .expect("Failed to create BLOCKS_FINALIZED metric");

    /// Rejected votes, labeled by reason
    pub static ref VOTES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "bft_votes_rejected_total",
        "Total number of votes rejected",
        &["reason"]
    )
    .expect("Failed to create VOTES_REJECTED metric");

    pub static ref ROUND_TIMEOUTS: IntCounter = register_int_counter!(
        "bft_round_timeouts_total",
        "Total number of rounds that timed out"
    )
    .expect("Failed to create ROUND_TIMEOUTS metric");
}

#[cfg(feature = "metrics")]
pub fn record_round_started() {
    ROUNDS_STARTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_finalized() {
    BLOCKS_FINALIZED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_vote_rejected(reason: &str) {
    VOTES_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_round_timeout() {
    ROUND_TIMEOUTS.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_round_started() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_finalized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_timeout() {}
