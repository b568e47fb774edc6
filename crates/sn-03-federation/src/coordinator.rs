//! Federation coordinator
//!
//! Composition root for the federation layer: one site registry, one
//! replicator, and shortcuts for the common site shapes.

use crate::domain::{ArchiveBundle, FederationResult, SiteType, SyncStatus, AIR_GAPPED_ZONE};
use crate::events::FederationEvent;
use crate::registry::FederationRegistry;
use crate::replicator::{AirGappedReplicator, ReplicatorConfig};
use crate::signing::{BundleSigner, BundleVerifier};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{AuditEvent, AuditSink, SiteId, SystemTimeSource, TimeSource};
use sn_02_bft_consensus::BlockHeader;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Aggregate view of the federation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FederationStatus {
    pub total_sites: usize,
    pub primary_site_id: Option<SiteId>,
    pub sites_by_type: BTreeMap<String, usize>,
    pub sites_by_status: BTreeMap<String, usize>,
    pub air_gapped_sites: usize,
    pub healthy_sites: usize,
    pub bundles_created: usize,
    pub replay_verifications: usize,
    pub valid_replay_verifications: usize,
}

pub struct FederationCoordinator {
    registry: Arc<FederationRegistry>,
    replicator: AirGappedReplicator,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
}

impl FederationCoordinator {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self::with_time_source(audit, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(audit: Arc<dyn AuditSink>, time_source: Arc<dyn TimeSource>) -> Self {
        let registry = Arc::new(
            FederationRegistry::new(audit.clone()).with_time_source(time_source.clone()),
        );
        let replicator =
            AirGappedReplicator::new(registry.clone(), ReplicatorConfig::default(), audit.clone())
                .with_time_source(time_source.clone());
        Self {
            registry,
            replicator,
            audit,
            time_source,
        }
    }

    fn emit(&self, event: FederationEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    /// Swap the bundle signer and verifier.
    pub fn with_signing(
        mut self,
        signer: Arc<dyn BundleSigner>,
        verifier: Arc<dyn BundleVerifier>,
    ) -> Self {
        self.replicator = self.replicator.with_signing(signer, verifier);
        self
    }

    pub fn registry(&self) -> &Arc<FederationRegistry> {
        &self.registry
    }

    pub fn replicator(&self) -> &AirGappedReplicator {
        &self.replicator
    }

    pub fn register_primary_site(
        &self,
        name: &str,
        public_key: &str,
        endpoint: &str,
        zone: &str,
    ) -> FederationResult<SiteId> {
        self.registry
            .register_site(name, public_key, Some(endpoint), SiteType::Primary, zone, None)
    }

    pub fn register_replica_site(
        &self,
        name: &str,
        public_key: &str,
        endpoint: &str,
        zone: &str,
    ) -> FederationResult<SiteId> {
        self.registry
            .register_site(name, public_key, Some(endpoint), SiteType::Replica, zone, None)
    }

    /// AIR_GAPPED site in zone Z3 with no endpoint.
    pub fn register_air_gapped_archive(
        &self,
        name: &str,
        public_key: &str,
    ) -> FederationResult<SiteId> {
        self.registry.register_site(
            name,
            public_key,
            None,
            SiteType::AirGapped,
            AIR_GAPPED_ZONE,
            None,
        )
    }

    /// Bundle `start..=end` from the primary site to `target`. `None` when
    /// no primary is registered or the replicator refuses the bundle.
    pub fn create_z3_archive_bundle(
        &self,
        target: &SiteId,
        start_height: u64,
        end_height: u64,
        blocks: &[BlockHeader],
        snapshot: &Value,
    ) -> Option<ArchiveBundle> {
        let Some(primary) = self.registry.primary_site_id() else {
            warn!("[sn-03] No primary site registered; cannot create archive bundle");
            self.emit(
                FederationEvent::BundleRejected,
                json!({"target_site": target, "reason": "no_primary_site"}),
            );
            return None;
        };
        self.replicator.create_archive_bundle(
            &primary,
            target,
            start_height,
            end_height,
            blocks,
            snapshot,
        )
    }

    /// Verify a bundle that claims to come from the primary site.
    pub fn verify_z3_archive(&self, bundle: &ArchiveBundle) -> bool {
        if self.registry.primary_site_id().as_ref() != Some(&bundle.source_site) {
            warn!(
                "[sn-03] Bundle {} does not originate from the primary site",
                bundle.bundle_id
            );
            self.emit(
                FederationEvent::BundleVerificationFailed,
                json!({
                    "bundle_id": bundle.bundle_id,
                    "source_site": bundle.source_site,
                    "valid": false,
                    "reason": "source_not_primary",
                }),
            );
            return false;
        }
        self.replicator.verify_bundle(bundle)
    }

    pub fn federation_status(&self) -> FederationStatus {
        let sites = self.registry.all_sites();
        let mut status = FederationStatus {
            total_sites: sites.len(),
            primary_site_id: self.registry.primary_site_id(),
            bundles_created: self.replicator.bundle_count(),
            replay_verifications: self.replicator.verification_count(),
            valid_replay_verifications: self.replicator.valid_verification_count(),
            ..Default::default()
        };
        for site in &sites {
            *status
                .sites_by_type
                .entry(site.site_type.as_str().to_string())
                .or_insert(0) += 1;
            *status
                .sites_by_status
                .entry(site.sync_status.as_str().to_string())
                .or_insert(0) += 1;
            if site.is_air_gapped() {
                status.air_gapped_sites += 1;
            }
            if site.is_healthy() {
                status.healthy_sites += 1;
            }
        }
        status
    }

    /// Mark a site as reachable again after an outage.
    pub fn mark_syncing(&self, site_id: &SiteId, height: u64) -> bool {
        self.registry
            .update_sync_status(site_id, SyncStatus::Syncing, Some(height), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReplicationMode;
    use chrono::{DateTime, Duration};
    use serde_json::json;
    use shared_types::{ContentHash, InMemoryAuditSink, ManualClock, ValidatorId};

    fn coordinator() -> (FederationCoordinator, Arc<ManualClock>, Arc<InMemoryAuditSink>) {
        let clock = Arc::new(ManualClock::at_epoch_start());
        let audit = Arc::new(InMemoryAuditSink::new());
        let coordinator = FederationCoordinator::with_time_source(audit.clone(), clock.clone());
        (coordinator, clock, audit)
    }

    fn block(height: u64) -> BlockHeader {
        BlockHeader {
            height,
            round: 0,
            timestamp: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
            proposer: ValidatorId::from("v1"),
            parent_hash: ContentHash::ZERO,
            state_root: ContentHash::digest(b"s"),
            txs_root: ContentHash::ZERO,
            consensus_hash: ContentHash::ZERO,
        }
    }

    #[test]
    fn test_air_gapped_archive_defaults() {
        let (c, _, _) = coordinator();
        let id = c.register_air_gapped_archive("vault", "pk").unwrap();
        let site = c.registry().get_site(&id).unwrap();
        assert_eq!(site.site_type, SiteType::AirGapped);
        assert_eq!(site.zone, "Z3");
        assert_eq!(site.credentials.endpoint, None);
        assert_eq!(site.replication_mode, ReplicationMode::Manual);
        assert!(site.is_air_gapped());
    }

    #[test]
    fn test_z3_bundle_flow() {
        let (c, clock, audit) = coordinator();
        let primary = c
            .register_primary_site("hq", "pk", "https://hq", "Z1")
            .unwrap();
        clock.advance(Duration::seconds(1));
        let vault = c.register_air_gapped_archive("vault", "pk-v").unwrap();
        clock.advance(Duration::seconds(1));
        let replica = c
            .register_replica_site("mirror", "pk-m", "https://m", "Z2")
            .unwrap();

        let blocks = vec![block(1), block(2)];
        let bundle = c
            .create_z3_archive_bundle(&vault, 1, 2, &blocks, &json!({}))
            .unwrap();
        assert_eq!(bundle.source_site, primary);
        assert!(c.verify_z3_archive(&bundle));
        assert!(c
            .create_z3_archive_bundle(&replica, 1, 2, &blocks, &json!({}))
            .is_none());

        let mut foreign = bundle.clone();
        foreign.source_site = replica;
        assert!(!c.verify_z3_archive(&foreign));
        let failed = audit.events_of_type("bundle_verification_failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].data["reason"], "source_not_primary");
    }

    #[test]
    fn test_bundle_requires_primary() {
        let (c, _, audit) = coordinator();
        let vault = c.register_air_gapped_archive("vault", "pk").unwrap();
        assert!(c
            .create_z3_archive_bundle(&vault, 1, 1, &[block(1)], &json!({}))
            .is_none());
        let rejected = audit.events_of_type("bundle_rejected");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].data["reason"], "no_primary_site");
        assert_eq!(c.federation_status().bundles_created, 0);
    }

    #[test]
    fn test_federation_status_counts() {
        let (c, clock, _) = coordinator();
        let primary = c
            .register_primary_site("hq", "pk", "https://hq", "Z1")
            .unwrap();
        clock.advance(Duration::seconds(1));
        let vault = c.register_air_gapped_archive("vault", "pk").unwrap();
        clock.advance(Duration::seconds(1));
        c.register_replica_site("mirror", "pk", "https://m", "Z3")
            .unwrap();

        c.registry()
            .update_sync_status(&primary, SyncStatus::Synced, Some(2), None);
        assert!(c.mark_syncing(&vault, 1));
        c.create_z3_archive_bundle(&vault, 1, 1, &[block(1)], &json!({}))
            .unwrap();

        let status = c.federation_status();
        assert_eq!(status.total_sites, 3);
        assert_eq!(status.primary_site_id, Some(primary));
        assert_eq!(status.sites_by_type["PRIMARY"], 1);
        assert_eq!(status.sites_by_type["AIR_GAPPED"], 1);
        assert_eq!(status.sites_by_status["PENDING"], 1);
        // The Z3 replica counts as air-gapped too.
        assert_eq!(status.air_gapped_sites, 2);
        assert_eq!(status.healthy_sites, 2);
        assert_eq!(status.bundles_created, 1);
        assert_eq!(status.replay_verifications, 0);
    }
}
