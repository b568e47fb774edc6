//! Block header

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{canonical_hash, iso8601, CanonicalRecord, ContentHash, ValidatorId};

/// Immutable, content-addressed block header.
///
/// `block_hash` is the canonical hash of every other field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    pub proposer: ValidatorId,
    pub parent_hash: ContentHash,
    pub state_root: ContentHash,
    pub txs_root: ContentHash,
    pub consensus_hash: ContentHash,
}

impl BlockHeader {
    pub fn block_hash(&self) -> ContentHash {
        self.record_hash()
    }
}

impl CanonicalRecord for BlockHeader {
    const HASH_KEY: &'static str = "block_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("height".into(), json!(self.height));
        fields.insert("round".into(), json!(self.round));
        fields.insert("timestamp".into(), json!(iso8601(self.timestamp)));
        fields.insert("proposer".into(), json!(self.proposer));
        fields.insert("parent_hash".into(), self.parent_hash.into());
        fields.insert("state_root".into(), self.state_root.into());
        fields.insert("txs_root".into(), self.txs_root.into());
        fields.insert("consensus_hash".into(), self.consensus_hash.into());
        fields
    }
}

/// Commitment to who proposed at `(height, round)` and the voting power
/// the round was tallied against.
pub fn consensus_hash(
    height: u64,
    round: u32,
    proposer: &ValidatorId,
    total_voting_power: u64,
) -> ContentHash {
    canonical_hash(&json!({
        "height": height,
        "round": round,
        "proposer": proposer,
        "total_voting_power": total_voting_power,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::verify_record;

    fn header() -> BlockHeader {
        let proposer = ValidatorId::from("v1");
        BlockHeader {
            height: 1,
            round: 0,
            timestamp: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
            consensus_hash: consensus_hash(1, 0, &proposer, 100),
            proposer,
            parent_hash: ContentHash::ZERO,
            state_root: ContentHash::digest(b"state"),
            txs_root: ContentHash::digest(b"txs"),
        }
    }

    #[test]
    fn test_serialized_header_verifies_its_hash() {
        let h = header();
        let record = h.to_record();
        assert_eq!(record["block_hash"], h.block_hash().to_hex());
        assert!(verify_record(&record, BlockHeader::HASH_KEY));
    }

    #[test]
    fn test_any_field_change_changes_hash() {
        let h = header();
        let mut other = h.clone();
        other.round = 1;
        assert_ne!(h.block_hash(), other.block_hash());

        let mut tampered = h.to_record();
        tampered.insert("height".into(), json!(2));
        assert!(!verify_record(&tampered, BlockHeader::HASH_KEY));
    }

    #[test]
    fn test_consensus_hash_binds_total_power() {
        let p = ValidatorId::from("v1");
        assert_ne!(consensus_hash(1, 0, &p, 100), consensus_hash(1, 0, &p, 101));
    }
}
