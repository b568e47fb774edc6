//! BFT Consensus Service
//!
//! Weighted two-phase voting over a proposer chosen from the rotation
//! schedule. A round moves PROPOSE → PREVOTE → PRECOMMIT → COMMIT →
//! FINALIZED; votes only count toward the block that was actually
//! proposed in that round.

use crate::domain::{
    consensus_hash, BlockHeader, ConsensusConfig, ConsensusError, ConsensusResult,
    ConsensusRound, ConsensusVote, QuorumState, RoundPhase, VoteType,
};
use crate::events::ConsensusEvent;
use crate::metrics;
use crate::ports::{ConsensusApi, VotingPowerSource};
use crate::state::{ConsensusState, RoundHandle};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_types::{AuditEvent, AuditSink, ContentHash, SystemTimeSource, TimeSource, ValidatorId};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct BftConsensus<P: VotingPowerSource> {
    power: Arc<P>,
    config: ConsensusConfig,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
    state: ConsensusState,
}

impl<P: VotingPowerSource> BftConsensus<P> {
    pub fn new(power: Arc<P>, config: ConsensusConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            power,
            config,
            audit,
            time_source: Arc::new(SystemTimeSource),
            state: ConsensusState::new(),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn voting_power_source(&self) -> &Arc<P> {
        &self.power
    }

    /// Finalized headers in `heights`, ascending.
    pub fn finalized_blocks(&self, heights: RangeInclusive<u64>) -> Vec<BlockHeader> {
        self.state
            .finalized
            .read()
            .range(heights)
            .map(|(_, header)| header.clone())
            .collect()
    }

    /// Rounds currently held in memory.
    pub fn open_round_count(&self) -> usize {
        self.state.rounds.read().len()
    }

    fn emit(&self, event: ConsensusEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    fn reject_vote(
        &self,
        vote_type: VoteType,
        height: u64,
        round: u32,
        validator_id: &ValidatorId,
        reason: &str,
    ) -> bool {
        debug!(
            "[sn-02] Rejected {} from {} at {}/{}: {}",
            vote_type.as_str(),
            validator_id,
            height,
            round,
            reason
        );
        metrics::record_vote_rejected(reason);
        self.emit(
            ConsensusEvent::VoteRejected,
            json!({
                "vote_type": vote_type.as_str(),
                "height": height,
                "round": round,
                "validator_id": validator_id,
                "reason": reason,
            }),
        );
        false
    }

    fn round_or_start(&self, height: u64, round: u32) -> ConsensusResult<RoundHandle> {
        if let Some(handle) = self.state.round(height, round) {
            return Ok(handle);
        }
        self.start_round(height, round)?;
        // A concurrent finalization may already have evicted it.
        self.state
            .round(height, round)
            .ok_or(ConsensusError::NoProposerAvailable {
                height,
                round,
                slot: self.config.slot_for(height, round),
            })
    }

    fn cast_vote(
        &self,
        vote_type: VoteType,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool {
        if self.state.is_finalized(height) {
            return self.reject_vote(vote_type, height, round, validator_id, "height_finalized");
        }
        let Some(handle) = self.state.round(height, round) else {
            return self.reject_vote(vote_type, height, round, validator_id, "unknown_round");
        };
        // A timed-out round stops counting once its successor is open.
        if self.state.round(height, round.saturating_add(1)).is_some() {
            return self.reject_vote(vote_type, height, round, validator_id, "round_superseded");
        }

        let finalized = {
            let mut guard = handle.lock();
            let current = &mut *guard;
            let expected_phase = match vote_type {
                VoteType::Prevote => RoundPhase::Prevote,
                VoteType::Precommit => RoundPhase::Precommit,
            };
            if current.phase != expected_phase {
                return self.reject_vote(vote_type, height, round, validator_id, "wrong_phase");
            }
            let proposed_hash = current.proposed_hash();
            let Some(quorum) = current.quorum.as_mut() else {
                return self.reject_vote(vote_type, height, round, validator_id, "no_proposal");
            };

            let votes = match vote_type {
                VoteType::Prevote => &quorum.prevotes,
                VoteType::Precommit => &quorum.precommits,
            };
            if votes.contains_key(validator_id) {
                return self.reject_vote(vote_type, height, round, validator_id, "duplicate_vote");
            }

            let power = self.power.voting_power(validator_id);
            if power == 0 {
                return self.reject_vote(vote_type, height, round, validator_id, "no_voting_power");
            }

            let vote = ConsensusVote {
                vote_type,
                height,
                round,
                block_hash,
                validator_id: validator_id.clone(),
                signature: signature.to_string(),
                timestamp: self.time_source.now(),
            };
            match vote_type {
                VoteType::Prevote => quorum.prevotes.insert(validator_id.clone(), vote),
                VoteType::Precommit => quorum.precommits.insert(validator_id.clone(), vote),
            };

            if proposed_hash != Some(block_hash) {
                warn!(
                    "[sn-02] {} from {} at {}/{} for unproposed block {}",
                    vote_type.as_str(),
                    validator_id,
                    height,
                    round,
                    block_hash
                );
                let event = match vote_type {
                    VoteType::Prevote => ConsensusEvent::NilPrevote,
                    VoteType::Precommit => ConsensusEvent::NilPrecommit,
                };
                self.emit(
                    event,
                    json!({
                        "height": height,
                        "round": round,
                        "validator_id": validator_id,
                        "block_hash": block_hash,
                        "proposed_hash": proposed_hash,
                    }),
                );
                return true;
            }

            match vote_type {
                VoteType::Prevote => {
                    quorum.prevote_power = quorum.prevote_power.saturating_add(power);
                    if quorum.has_prevote_quorum() {
                        let (tallied, total) = (quorum.prevote_power, quorum.total_voting_power);
                        current.phase = RoundPhase::Precommit;
                        info!(
                            "[sn-02] Prevote quorum at {}/{}: {}/{}",
                            height, round, tallied, total
                        );
                        self.emit(
                            ConsensusEvent::PrevoteQuorumReached,
                            json!({
                                "height": height,
                                "round": round,
                                "block_hash": block_hash,
                                "prevote_power": tallied,
                                "total_voting_power": total,
                            }),
                        );
                    }
                    None
                }
                VoteType::Precommit => {
                    quorum.precommit_power = quorum.precommit_power.saturating_add(power);
                    if !quorum.has_precommit_quorum() {
                        return true;
                    }
                    let (tallied, total) = (quorum.precommit_power, quorum.total_voting_power);
                    match current.proposed_block.clone() {
                        // The log insert is the single commit point for a height.
                        Some(header) if self.state.try_finalize(&header) => {
                            current.phase = RoundPhase::Commit;
                            self.emit(
                                ConsensusEvent::BlockCommitted,
                                json!({
                                    "height": height,
                                    "round": round,
                                    "block_hash": block_hash,
                                    "precommit_power": tallied,
                                    "total_voting_power": total,
                                }),
                            );
                            current.phase = RoundPhase::Finalized;
                            Some(header)
                        }
                        _ => {
                            warn!(
                                "[sn-02] Height {} finalized by another round; {}/{} stays open",
                                height, height, round
                            );
                            None
                        }
                    }
                }
            }
        };

        if let Some(header) = finalized {
            self.record_finalized(header);
        }
        true
    }

    /// Logging and eviction after `header` entered the finalized log.
    fn record_finalized(&self, header: BlockHeader) {
        let height = header.height;
        let block_hash = header.block_hash();

        metrics::record_block_finalized();
        info!(
            "[sn-02] Finalized block {} at height {} round {}",
            block_hash, height, header.round
        );
        self.emit(
            ConsensusEvent::BlockFinalized,
            json!({
                "height": height,
                "round": header.round,
                "block_hash": block_hash,
                "proposer": header.proposer,
            }),
        );

        let evicted = self.state.evict_below(height);
        if evicted > 0 {
            debug!("[sn-02] Evicted {} rounds below height {}", evicted, height);
            self.emit(
                ConsensusEvent::RoundsEvicted,
                json!({"below_height": height, "count": evicted}),
            );
        }
    }

    fn finalizing_round(&self, height: u64) -> Option<ConsensusRound> {
        let round = self.state.finalized_round(height)?;
        self.get_round(height, round)
    }
}

impl<P: VotingPowerSource> ConsensusApi for BftConsensus<P> {
    fn start_round(&self, height: u64, round: u32) -> ConsensusResult<ConsensusRound> {
        if self.state.is_finalized(height) {
            debug!("[sn-02] Not opening {}/{}: height already finalized", height, round);
            return Err(ConsensusError::HeightFinalized { height });
        }
        if let Some(existing) = self.state.round(height, round) {
            return Ok(existing.lock().clone());
        }

        let slot = self.config.slot_for(height, round);
        let proposer = self
            .power
            .proposer_for_slot(slot)
            .ok_or(ConsensusError::NoProposerAvailable {
                height,
                round,
                slot,
            })?;

        let fresh = ConsensusRound::new(
            height,
            round,
            proposer.clone(),
            self.time_source.now(),
            self.config.round_timeout,
        );
        let snapshot = {
            let mut rounds = self.state.rounds.write();
            if let Some(existing) = rounds.get(&(height, round)) {
                // Lost a race with a concurrent start of the same round.
                let existing = existing.clone();
                drop(rounds);
                return Ok(existing.lock().clone());
            }
            rounds.insert((height, round), Arc::new(Mutex::new(fresh.clone())));
            fresh
        };

        metrics::record_round_started();
        info!(
            "[sn-02] Round {}/{} started, proposer {} (slot {})",
            height, round, proposer, slot
        );
        self.emit(
            ConsensusEvent::RoundStarted,
            json!({
                "height": height,
                "round": round,
                "proposer": proposer,
                "slot": slot,
            }),
        );
        Ok(snapshot)
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
        if self.state.is_finalized(height) {
            self.emit(
                ConsensusEvent::InvalidProposal,
                json!({
                    "height": height,
                    "round": round,
                    "reason": "height_finalized",
                    "received": proposer,
                }),
            );
            return Ok(None);
        }
        let handle = self.round_or_start(height, round)?;
        let mut current = handle.lock();

        if current.proposer != *proposer {
            warn!(
                "[sn-02] Proposal at {}/{} from {}, expected {}",
                height, round, proposer, current.proposer
            );
            self.emit(
                ConsensusEvent::InvalidProposal,
                json!({
                    "height": height,
                    "round": round,
                    "reason": "wrong_proposer",
                    "expected": current.proposer,
                    "received": proposer,
                }),
            );
            return Ok(None);
        }
        if current.phase != RoundPhase::Propose {
            self.emit(
                ConsensusEvent::InvalidProposal,
                json!({
                    "height": height,
                    "round": round,
                    "reason": "wrong_phase",
                    "phase": current.phase.as_str(),
                }),
            );
            return Ok(None);
        }

        let total_voting_power = self.power.total_voting_power();
        let header = BlockHeader {
            height,
            round,
            timestamp: self.time_source.now(),
            proposer: proposer.clone(),
            parent_hash,
            state_root,
            txs_root,
            consensus_hash: consensus_hash(height, round, proposer, total_voting_power),
        };
        let block_hash = header.block_hash();

        current.proposed_block = Some(header.clone());
        current.quorum = Some(QuorumState::new(total_voting_power));
        current.phase = RoundPhase::Prevote;

        info!(
            "[sn-02] Block {} proposed at {}/{} by {}",
            block_hash, height, round, proposer
        );
        self.emit(
            ConsensusEvent::BlockProposed,
            json!({
                "height": height,
                "round": round,
                "proposer": proposer,
                "block_hash": block_hash,
                "total_voting_power": total_voting_power,
            }),
        );
        Ok(Some(header))
    }

    fn prevote(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool {
        self.cast_vote(VoteType::Prevote, height, round, block_hash, validator_id, signature)
    }

    fn precommit(
        &self,
        height: u64,
        round: u32,
        block_hash: ContentHash,
        validator_id: &ValidatorId,
        signature: &str,
    ) -> bool {
        self.cast_vote(VoteType::Precommit, height, round, block_hash, validator_id, signature)
    }

    fn handle_timeout(&self, height: u64, round: u32) -> ConsensusResult<Option<ConsensusRound>> {
        if self.state.is_finalized(height) {
            return Ok(self.finalizing_round(height));
        }
        let Some(handle) = self.state.round(height, round) else {
            return Ok(None);
        };
        let (phase, started_at) = {
            let current = handle.lock();
            if current.is_finalized() || !current.is_expired(self.time_source.now()) {
                return Ok(Some(current.clone()));
            }
            (current.phase, current.started_at)
        };

        let next = round.saturating_add(1);
        if let Some(successor) = self.state.round(height, next) {
            return Ok(Some(successor.lock().clone()));
        }

        let elapsed_ms = (self.time_source.now() - started_at).num_milliseconds();
        metrics::record_round_timeout();
        warn!(
            "[sn-02] Round {}/{} timed out in {} after {}ms",
            height,
            round,
            phase.as_str(),
            elapsed_ms
        );
        self.emit(
            ConsensusEvent::RoundTimeout,
            json!({
                "height": height,
                "round": round,
                "phase": phase.as_str(),
                "elapsed_ms": elapsed_ms,
            }),
        );
        match self.start_round(height, next) {
            // Finalized between the expiry check and the successor start.
            Err(ConsensusError::HeightFinalized { .. }) => Ok(self.finalizing_round(height)),
            other => other.map(Some),
        }
    }

    fn get_round(&self, height: u64, round: u32) -> Option<ConsensusRound> {
        self.state.round(height, round).map(|handle| handle.lock().clone())
    }

    fn finalized_block(&self, height: u64) -> Option<BlockHeader> {
        self.state.finalized.read().get(&height).cloned()
    }

    fn latest_finalized_height(&self) -> Option<u64> {
        self.state.latest_finalized_height()
    }
}
