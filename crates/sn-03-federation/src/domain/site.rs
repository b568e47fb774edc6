//! Federation sites

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_types::{iso8601, CanonicalRecord, ContentHash, SiteId};

/// Zone label for sites without network connectivity.
pub const AIR_GAPPED_ZONE: &str = "Z3";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteType {
    Primary,
    Replica,
    Archive,
    AirGapped,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Replica => "REPLICA",
            Self::Archive => "ARCHIVE",
            Self::AirGapped => "AIR_GAPPED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Synced,
    Syncing,
    Behind,
    Disconnected,
    Pending,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "SYNCED",
            Self::Syncing => "SYNCING",
            Self::Behind => "BEHIND",
            Self::Disconnected => "DISCONNECTED",
            Self::Pending => "PENDING",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMode {
    RealTime,
    Batch,
    Manual,
    Delayed,
}

impl ReplicationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealTime => "REAL_TIME",
            Self::Batch => "BATCH",
            Self::Manual => "MANUAL",
            Self::Delayed => "DELAYED",
        }
    }

    /// Z3 sites are always manual; archives batch; everything else streams.
    pub fn default_for(site_type: SiteType, zone: &str) -> Self {
        if zone == AIR_GAPPED_ZONE {
            Self::Manual
        } else if site_type == SiteType::Archive {
            Self::Batch
        } else {
            Self::RealTime
        }
    }
}

/// Immutable identity of a site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCredentials {
    pub site_id: SiteId,
    pub name: String,
    pub public_key: String,
    /// `None` for air-gapped sites.
    pub endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CanonicalRecord for SiteCredentials {
    const HASH_KEY: &'static str = "credentials_hash";

    fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("site_id".into(), json!(self.site_id));
        fields.insert("name".into(), json!(self.name));
        fields.insert("public_key".into(), json!(self.public_key));
        fields.insert("endpoint".into(), json!(self.endpoint));
        fields.insert("created_at".into(), json!(iso8601(self.created_at)));
        fields
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FederationSite {
    pub credentials: SiteCredentials,
    pub site_type: SiteType,
    pub zone: String,
    pub replication_mode: ReplicationMode,
    pub sync_status: SyncStatus,
    pub last_sync_height: Option<u64>,
    pub last_state_hash: Option<ContentHash>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl FederationSite {
    pub fn id(&self) -> &SiteId {
        &self.credentials.site_id
    }

    pub fn is_air_gapped(&self) -> bool {
        self.site_type == SiteType::AirGapped || self.zone == AIR_GAPPED_ZONE
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Synced | SyncStatus::Syncing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_replication_mode() {
        assert_eq!(
            ReplicationMode::default_for(SiteType::Archive, AIR_GAPPED_ZONE),
            ReplicationMode::Manual
        );
        assert_eq!(
            ReplicationMode::default_for(SiteType::Archive, "Z1"),
            ReplicationMode::Batch
        );
        assert_eq!(
            ReplicationMode::default_for(SiteType::Replica, "Z2"),
            ReplicationMode::RealTime
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&SiteType::AirGapped).unwrap(),
            "\"AIR_GAPPED\""
        );
        assert_eq!(
            serde_json::to_string(&ReplicationMode::RealTime).unwrap(),
            "\"REAL_TIME\""
        );
        assert_eq!(SyncStatus::Disconnected.as_str(), "DISCONNECTED");
    }
}
