//! # Trajectory-Aware Consensus
//!
//! Decorator over any [`ConsensusApi`] that stops new proposals while the
//! network's predicted collapse probability is above a threshold. Voting,
//! timeouts and queries pass straight through, so rounds already in flight
//! can still finish.
//!
//! ```text
//! update_trajectory_metrics(p > threshold) ──→ SUSPENDED ──resume_consensus (p <= threshold)──→ RUNNING
//! ```

use crate::domain::{BlockHeader, ConsensusResult, ConsensusRound};
use crate::events::ConsensusEvent;
use crate::ports::ConsensusApi;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{AuditEvent, AuditSink, ContentHash, SystemTimeSource, TimeSource, ValidatorId};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct TrajectoryConfig {
    /// Collapse probability above which proposals are suspended.
    pub collapse_threshold: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            collapse_threshold: 0.3,
        }
    }
}

/// Latest trajectory reading and the suspension flag derived from it.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrajectoryState {
    pub health_score: f64,
    pub collapse_probability: f64,
    pub signals: Vec<String>,
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
}

pub struct TrajectoryAwareConsensus<C: ConsensusApi> {
    inner: C,
    config: TrajectoryConfig,
    state: RwLock<TrajectoryState>,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
}

impl<C: ConsensusApi> TrajectoryAwareConsensus<C> {
    pub fn new(inner: C, config: TrajectoryConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            inner,
            config,
            state: RwLock::new(TrajectoryState {
                health_score: 1.0,
                ..Default::default()
            }),
            audit,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn collapse_threshold(&self) -> f64 {
        self.config.collapse_threshold
    }

    pub fn is_suspended(&self) -> bool {
        self.state.read().is_suspended
    }

    pub fn trajectory(&self) -> TrajectoryState {
        self.state.read().clone()
    }

    fn emit(&self, event: ConsensusEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    /// Store a new reading. Suspends when `collapse_probability` exceeds the
    /// threshold; never resumes on its own.
    pub fn update_trajectory_metrics(
        &self,
        health_score: f64,
        collapse_probability: f64,
        signals: Vec<String>,
    ) {
        let mut state = self.state.write();
        state.health_score = health_score;
        state.collapse_probability = collapse_probability;
        state.signals = signals;

        if collapse_probability > self.config.collapse_threshold && !state.is_suspended {
            let reason = format!(
                "collapse probability {:.3} exceeds threshold {:.3}",
                collapse_probability, self.config.collapse_threshold
            );
            warn!("[sn-02] Consensus suspended: {}", reason);
            state.is_suspended = true;
            state.suspension_reason = Some(reason.clone());
            self.emit(
                ConsensusEvent::ConsensusSuspended,
                json!({
                    "health_score": health_score,
                    "collapse_probability": collapse_probability,
                    "signals": state.signals,
                    "reason": reason,
                }),
            );
        }
    }

    /// Lift a suspension if the latest reading allows it. Returns whether
    /// consensus is running afterwards.
    pub fn resume_consensus(&self) -> bool {
        let mut state = self.state.write();
        if !state.is_suspended {
            return true;
        }
        if state.collapse_probability > self.config.collapse_threshold {
            return false;
        }
        state.is_suspended = false;
        state.suspension_reason = None;
        info!(
            "[sn-02] Consensus resumed at collapse probability {:.3}",
            state.collapse_probability
        );
        self.emit(
            ConsensusEvent::ConsensusResumed,
            json!({"collapse_probability": state.collapse_probability}),
        );
        true
    }
}

impl<C: ConsensusApi> ConsensusApi for TrajectoryAwareConsensus<C> {
    fn start_round(&self, height: u64, round: u32) -> ConsensusResult<ConsensusRound> {
        self.inner.start_round(height, round)
    }

    fn propose_block(
        &self,
        height: u64,
        round: u32,
        proposer: &ValidatorId,
        parent_hash: ContentHash,
        state_root: ContentHash,
        txs_root: ContentHash,
    ) -> ConsensusResult<Option<BlockHeader>> {
        {
            let state = self.state.read();
            if state.is_suspended {
                self.emit(
                    ConsensusEvent::ProposalBlockedSuspended,
                    json!({
                        "height": height,
                        "round": round,
                        "proposer": proposer,
                        "reason": state.suspension_reason,
                    }),
                );
                return Ok(None);
            }
        }
        self.inner
            .propose_block(height, round, proposer, parent_hash, state_root, txs_root)
    }

    fn prevote(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool {
        self.inner
            .prevote(height, round, block_hash, validator_id, signature)
    }

    fn precommit(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool {
        self.inner
            .precommit(height, round, block_hash, validator_id, signature)
    }

    fn handle_timeout(&self, height: u64, round: u32) -> ConsensusResult<Option<ConsensusRound>> {
        self.inner.handle_timeout(height, round)
    }

    fn get_round(&self, height: u64, round: u32) -> Option<ConsensusRound> {
        self.inner.get_round(height, round)
    }

    fn finalized_block(&self, height: u64) -> Option<BlockHeader> {
        self.inner.finalized_block(height)
    }

    fn latest_finalized_height(&self) -> Option<u64> {
        self.inner.latest_finalized_height()
    }
}
