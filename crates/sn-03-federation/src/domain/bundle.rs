//! Archive bundles and replay verification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{canonical_json, iso8601, CanonicalRecord, ContentHash, SiteId};

/// Hashed package of a block range plus a state snapshot, for manual
/// transfer to an air-gapped site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveBundle {
    pub bundle_id: ContentHash,
    pub source_site: SiteId,
    pub target_site: SiteId,
    pub start_height: u64,
    pub end_height: u64,
    pub block_count: u64,
    pub blocks_hash: ContentHash,
    pub state_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub signature: String,
}

impl ArchiveBundle {
    /// Every field except the signature.
    pub fn content(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("bundle_id".into(), self.bundle_id.into());
        fields.insert("source_site".into(), json!(self.source_site));
        fields.insert("target_site".into(), json!(self.target_site));
        fields.insert("start_height".into(), json!(self.start_height));
        fields.insert("end_height".into(), json!(self.end_height));
        fields.insert("block_count".into(), json!(self.block_count));
        fields.insert("blocks_hash".into(), self.blocks_hash.into());
        fields.insert("state_hash".into(), self.state_hash.into());
        fields.insert("created_at".into(), json!(iso8601(self.created_at)));
        fields
    }

    /// Bytes covered by the signature: canonical JSON of [`Self::content`].
    pub fn signing_payload(&self) -> Vec<u8> {
        canonical_json(&Value::Object(self.content())).into_bytes()
    }
}

impl CanonicalRecord for ArchiveBundle {
    const HASH_KEY: &'static str = "bundle_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = self.content();
        fields.insert("signature".into(), json!(self.signature));
        fields
    }
}

/// How a replay check concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// Re-executed state matches the expected hash.
    Matched,
    Mismatched,
    /// No executor was available; nothing was proven.
    NotExecuted,
    ExecutorFailed,
}

impl ReplayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Mismatched => "mismatched",
            Self::NotExecuted => "not_executed",
            Self::ExecutorFailed => "executor_failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayVerification {
    pub verification_id: ContentHash,
    pub site_id: SiteId,
    pub start_height: u64,
    pub end_height: u64,
    pub blocks_replayed: u64,
    pub expected_state_hash: ContentHash,
    pub actual_state_hash: Option<ContentHash>,
    pub outcome: ReplayOutcome,
    pub is_valid: bool,
    pub error: Option<String>,
    pub verified_at: DateTime<Utc>,
}

impl CanonicalRecord for ReplayVerification {
    const HASH_KEY: &'static str = "verification_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("verification_id".into(), self.verification_id.into());
        fields.insert("site_id".into(), json!(self.site_id));
        fields.insert("start_height".into(), json!(self.start_height));
        fields.insert("end_height".into(), json!(self.end_height));
        fields.insert("blocks_replayed".into(), json!(self.blocks_replayed));
        fields.insert("expected_state_hash".into(), self.expected_state_hash.into());
        fields.insert("actual_state_hash".into(), json!(self.actual_state_hash));
        fields.insert("outcome".into(), json!(self.outcome.as_str()));
        fields.insert("is_valid".into(), json!(self.is_valid));
        fields.insert("error".into(), json!(self.error));
        fields.insert("verified_at".into(), json!(iso8601(self.verified_at)));
        fields
    }
}
