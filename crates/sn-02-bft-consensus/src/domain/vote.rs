//! Consensus votes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{iso8601, CanonicalRecord, ContentHash, ValidatorId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    Prevote,
    Precommit,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prevote => "PREVOTE",
            Self::Precommit => "PRECOMMIT",
        }
    }
}

/// A single signed vote. The signature is opaque to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusVote {
    pub vote_type: VoteType,
    pub height: u64,
    pub round: u32,
    pub block_hash: ContentHash,
    pub validator_id: ValidatorId,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

impl CanonicalRecord for ConsensusVote {
    const HASH_KEY: &'static str = "vote_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("vote_type".into(), json!(self.vote_type.as_str()));
        fields.insert("height".into(), json!(self.height));
        fields.insert("round".into(), json!(self.round));
        fields.insert("block_hash".into(), self.block_hash.into());
        fields.insert("validator_id".into(), json!(self.validator_id));
        fields.insert("signature".into(), json!(self.signature));
        fields.insert("timestamp".into(), json!(iso8601(self.timestamp)));
        fields
    }
}
