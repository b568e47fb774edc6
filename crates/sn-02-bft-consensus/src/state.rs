use crate::domain::{BlockHeader, ConsensusRound};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared handle to one round. Votes on a round are serialized by its mutex.
pub type RoundHandle = Arc<Mutex<ConsensusRound>>;

/// Encapsulates the mutable state of the consensus engine: open rounds
/// keyed by `(height, round)` and the finalized block log.
///
/// Lock order: the `rounds` map lock is never held while a round mutex is
/// being acquired.
#[derive(Default)]
pub struct ConsensusState {
    pub rounds: RwLock<BTreeMap<(u64, u32), RoundHandle>>,
    pub finalized: RwLock<BTreeMap<u64, BlockHeader>>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self, height: u64, round: u32) -> Option<RoundHandle> {
        self.rounds.read().get(&(height, round)).cloned()
    }

    pub fn is_finalized(&self, height: u64) -> bool {
        self.finalized.read().contains_key(&height)
    }

    /// Round that finalized `height`, if any.
    pub fn finalized_round(&self, height: u64) -> Option<u32> {
        self.finalized.read().get(&height).map(|header| header.round)
    }

    /// Append `header` to the log unless its height is already final.
    pub fn try_finalize(&self, header: &BlockHeader) -> bool {
        let mut log = self.finalized.write();
        if log.contains_key(&header.height) {
            return false;
        }
        log.insert(header.height, header.clone());
        true
    }

    pub fn latest_finalized_height(&self) -> Option<u64> {
        self.finalized.read().keys().next_back().copied()
    }

    /// Drop every round below `height`. Returns how many were removed.
    pub fn evict_below(&self, height: u64) -> usize {
        let mut rounds = self.rounds.write();
        let kept = rounds.split_off(&(height, 0));
        let evicted = rounds.len();
        *rounds = kept;
        evicted
    }
}
