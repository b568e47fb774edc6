//! Round timeout driver
//!
//! The engine never runs timers itself; `handle_timeout` is a poll. This
//! adapter polls it from a tokio task on a fixed interval and follows the
//! round number forward until the height finalizes.

use crate::domain::ConsensusRound;
use crate::ports::ConsensusApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct TimeoutDriver<C: ConsensusApi + 'static> {
    consensus: Arc<C>,
    poll_interval: Duration,
}

/// Handle to a running driver.
pub struct TimeoutHandle {
    /// Latest round number the driver is watching.
    pub rounds: watch::Receiver<u32>,
    task: JoinHandle<Option<ConsensusRound>>,
}

impl TimeoutHandle {
    /// Wait for the driver to exit. Yields the finalized round, or `None`
    /// if the driver stopped for another reason.
    pub async fn finished(self) -> Option<ConsensusRound> {
        self.task.await.ok().flatten()
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn current_round(&self) -> u32 {
        *self.rounds.borrow()
    }
}

impl<C: ConsensusApi + 'static> TimeoutDriver<C> {
    pub fn new(consensus: Arc<C>, poll_interval: Duration) -> Self {
        Self {
            consensus,
            poll_interval,
        }
    }

    /// One poll of `(height, round)`. Returns the round to watch next, or
    /// `None` once there is nothing left to drive.
    pub fn poll_once(&self, height: u64, round: u32) -> Option<ConsensusRound> {
        match self.consensus.handle_timeout(height, round) {
            Ok(Some(current)) => Some(current),
            Ok(None) => {
                debug!("[sn-02] Timeout driver: round {}/{} no longer held", height, round);
                None
            }
            Err(e) => {
                warn!("[sn-02] Timeout driver stopped at {}/{}: {}", height, round, e);
                None
            }
        }
    }

    /// Drive timeouts for `height` starting at `round`.
    pub fn spawn(self, height: u64, round: u32) -> TimeoutHandle {
        let (tx, rx) = watch::channel(round);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.poll_interval);
            let mut watching = round;
            loop {
                interval.tick().await;
                let current = self.poll_once(height, watching)?;
                if current.is_finalized() {
                    return Some(current);
                }
                if current.round != watching {
                    watching = current.round;
                    // Receivers may all be gone; the driver keeps going.
                    let _ = tx.send(watching);
                }
            }
        });
        TimeoutHandle { rounds: rx, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticVotingPower;
    use crate::domain::ConsensusConfig;
    use crate::BftConsensus;
    use shared_types::{ContentHash, InMemoryAuditSink, ManualClock, ValidatorId};

    fn engine(clock: Arc<ManualClock>) -> Arc<BftConsensus<StaticVotingPower>> {
        let power = Arc::new(StaticVotingPower::new([("v1", 40), ("v2", 30), ("v3", 30)]));
        Arc::new(
            BftConsensus::new(
                power,
                ConsensusConfig::default(),
                Arc::new(InMemoryAuditSink::new()),
            )
            .with_time_source(clock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_advances_expired_round() {
        let clock = Arc::new(ManualClock::at_epoch_start());
        let consensus = engine(clock.clone());
        consensus.start_round(1, 0).unwrap();

        let mut handle = TimeoutDriver::new(consensus.clone(), Duration::from_secs(1)).spawn(1, 0);
        clock.advance(chrono::Duration::seconds(31));

        handle.rounds.changed().await.unwrap();
        assert_eq!(handle.current_round(), 1);
        assert!(consensus.get_round(1, 1).is_some());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_exits_on_finalization() {
        let clock = Arc::new(ManualClock::at_epoch_start());
        let consensus = engine(clock);
        let proposer = consensus.start_round(1, 0).unwrap().proposer;
        let header = consensus
            .propose_block(1, 0, &proposer, ContentHash::ZERO, ContentHash::ZERO, ContentHash::ZERO)
            .unwrap()
            .unwrap();

        let handle = TimeoutDriver::new(consensus.clone(), Duration::from_millis(100)).spawn(1, 0);
        let hash = header.block_hash();
        for v in ["v1", "v2"] {
            consensus.prevote(1, 0, hash, &ValidatorId::from(v), "sig");
        }
        for v in ["v1", "v2"] {
            consensus.precommit(1, 0, hash, &ValidatorId::from(v), "sig");
        }

        let finalized = handle.finished().await.unwrap();
        assert_eq!(finalized.round, 0);
        assert!(finalized.is_finalized());
    }

    #[test]
    fn test_poll_unknown_round() {
        let consensus = engine(Arc::new(ManualClock::at_epoch_start()));
        let driver = TimeoutDriver::new(consensus, Duration::from_secs(1));
        assert!(driver.poll_once(5, 0).is_none());
    }
}
