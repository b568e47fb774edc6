//! Federation site registry

use crate::domain::{
    FederationError, FederationResult, FederationSite, ReplicationMode, SiteCredentials,
    SiteType, SyncStatus,
};
use crate::events::FederationEvent;
use parking_lot::RwLock;
use serde_json::{json, Value};
use shared_types::{
    canonical_hash, iso8601, AuditEvent, AuditSink, ContentHash, SiteId, SystemTimeSource,
    TimeSource,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryInner {
    sites: BTreeMap<SiteId, FederationSite>,
    primary_site_id: Option<SiteId>,
}

pub struct FederationRegistry {
    inner: RwLock<RegistryInner>,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
}

impl FederationRegistry {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            audit,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    fn emit(&self, event: FederationEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    /// Register a site. The first PRIMARY becomes the federation primary.
    ///
    /// `mode` defaults to MANUAL in zone Z3, BATCH for archives and
    /// REAL_TIME otherwise.
    pub fn register_site(
        &self,
        name: &str,
        public_key: &str,
        endpoint: Option<&str>,
        site_type: SiteType,
        zone: &str,
        mode: Option<ReplicationMode>,
    ) -> FederationResult<SiteId> {
        if name.is_empty() {
            return Err(FederationError::EmptyName);
        }

        let created_at = self.time_source.now();
        let site_id = SiteId::new(
            canonical_hash(&json!({"name": name, "timestamp": iso8601(created_at)})).to_hex(),
        );
        let replication_mode = mode.unwrap_or_else(|| ReplicationMode::default_for(site_type, zone));

        let mut inner = self.inner.write();
        if inner.sites.contains_key(&site_id) {
            return Err(FederationError::DuplicateSite(site_id));
        }

        let site = FederationSite {
            credentials: SiteCredentials {
                site_id: site_id.clone(),
                name: name.to_string(),
                public_key: public_key.to_string(),
                endpoint: endpoint.map(str::to_string),
                created_at,
            },
            site_type,
            zone: zone.to_string(),
            replication_mode,
            sync_status: SyncStatus::Pending,
            last_sync_height: None,
            last_state_hash: None,
            last_sync_at: None,
        };
        let air_gapped = site.is_air_gapped();
        inner.sites.insert(site_id.clone(), site);

        let became_primary = site_type == SiteType::Primary && inner.primary_site_id.is_none();
        if became_primary {
            inner.primary_site_id = Some(site_id.clone());
        }

        info!(
            "[sn-03] Registered {} site {} ({}) in zone {}",
            site_type.as_str(),
            name,
            site_id,
            zone
        );
        self.emit(
            FederationEvent::SiteRegistered,
            json!({
                "site_id": site_id,
                "name": name,
                "site_type": site_type.as_str(),
                "zone": zone,
                "replication_mode": replication_mode.as_str(),
                "air_gapped": air_gapped,
                "primary": became_primary,
            }),
        );
        Ok(site_id)
    }

    /// Record a sync report. `false` for an unknown site.
    pub fn update_sync_status(
        &self,
        site_id: &SiteId,
        status: SyncStatus,
        height: Option<u64>,
        state_hash: Option<ContentHash>,
    ) -> bool {
        let now = self.time_source.now();
        let mut inner = self.inner.write();
        let Some(site) = inner.sites.get_mut(site_id) else {
            debug!("[sn-03] Sync status for unknown site {}", site_id);
            self.emit(
                FederationEvent::SyncStatusRejected,
                json!({
                    "site_id": site_id,
                    "status": status.as_str(),
                    "reason": "unknown_site",
                }),
            );
            return false;
        };

        let previous = site.sync_status;
        site.sync_status = status;
        if let Some(height) = height {
            site.last_sync_height = Some(height);
        }
        if let Some(hash) = state_hash {
            site.last_state_hash = Some(hash);
        }
        site.last_sync_at = Some(now);

        self.emit(
            FederationEvent::SyncStatusUpdated,
            json!({
                "site_id": site_id,
                "previous": previous.as_str(),
                "status": status.as_str(),
                "height": height,
                "state_hash": state_hash,
            }),
        );
        true
    }

    // === QUERIES ===

    pub fn get_site(&self, site_id: &SiteId) -> Option<FederationSite> {
        self.inner.read().sites.get(site_id).cloned()
    }

    pub fn primary_site_id(&self) -> Option<SiteId> {
        self.inner.read().primary_site_id.clone()
    }

    pub fn all_sites(&self) -> Vec<FederationSite> {
        self.inner.read().sites.values().cloned().collect()
    }

    pub fn sites_by_type(&self, site_type: SiteType) -> Vec<FederationSite> {
        self.filtered(|s| s.site_type == site_type)
    }

    /// AIR_GAPPED sites and any site in zone Z3.
    pub fn air_gapped_sites(&self) -> Vec<FederationSite> {
        self.filtered(FederationSite::is_air_gapped)
    }

    /// SYNCED or SYNCING.
    pub fn healthy_sites(&self) -> Vec<FederationSite> {
        self.filtered(FederationSite::is_healthy)
    }

    pub fn site_count(&self) -> usize {
        self.inner.read().sites.len()
    }

    fn filtered(&self, keep: impl Fn(&FederationSite) -> bool) -> Vec<FederationSite> {
        self.inner
            .read()
            .sites
            .values()
            .filter(|s| keep(s))
            .cloned()
            .collect()
    }
}
