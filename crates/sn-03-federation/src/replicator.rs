//! # Air-Gapped Replicator
//!
//! Packages finalized block ranges and a state snapshot into signed
//! [`ArchiveBundle`]s for manual transfer, and checks them on arrival.
//!
//! ```text
//! primary ──create_archive_bundle──→ bundle ══ removable media ══→ verify_bundle ──→ apply_bundle ──→ SYNCED
//!                                                                        └──verify_replay(executor)──→ ReplayVerification
//! ```
//!
//! Applying a bundle is all-or-nothing: the signature, the blocks hash and
//! the state hash must all match before the target's sync status moves.

use crate::domain::{ArchiveBundle, ReplayError, ReplayOutcome, ReplayVerification, SyncStatus};
use crate::events::FederationEvent;
use crate::registry::FederationRegistry;
use crate::signing::{BundleSigner, BundleVerifier, ContentHashSigner};
use parking_lot::RwLock;
use serde_json::{json, Value};
use shared_types::{
    canonical_hash, iso8601, AuditEvent, AuditSink, CanonicalRecord, ContentHash, SiteId,
    SystemTimeSource, TimeSource,
};
use sn_02_bft_consensus::BlockHeader;
use std::sync::Arc;
use tracing::{info, warn};

/// Re-executes a block range and reports the resulting state hash.
pub trait ReplayExecutor: Send + Sync {
    fn replay(&self, blocks: &[BlockHeader]) -> Result<ContentHash, ReplayError>;
}

/// Replays headers only: checks that heights are consecutive and each
/// header links to its predecessor, then reports the last state root.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderChainExecutor;

impl ReplayExecutor for HeaderChainExecutor {
    fn replay(&self, blocks: &[BlockHeader]) -> Result<ContentHash, ReplayError> {
        let Some(first) = blocks.first() else {
            return Err(ReplayError::ExecutionFailed {
                height: 0,
                reason: "empty block range".into(),
            });
        };
        let mut previous = first;
        for block in &blocks[1..] {
            let expected = previous.height.checked_add(1).ok_or_else(|| {
                ReplayError::ExecutionFailed {
                    height: previous.height,
                    reason: "height overflow".into(),
                }
            })?;
            if block.height != expected {
                return Err(ReplayError::GapInRange(expected));
            }
            if block.parent_hash != previous.block_hash() {
                return Err(ReplayError::ExecutionFailed {
                    height: block.height,
                    reason: "parent hash does not match previous block".into(),
                });
            }
            previous = block;
        }
        Ok(previous.state_root)
    }
}

#[derive(Clone, Debug)]
pub struct ReplicatorConfig {
    /// Largest `end - start + 1` a single bundle may cover.
    pub max_bundle_span: u64,
    /// Require `blocks` to be exactly heights `start..=end`, in order.
    pub require_contiguous_blocks: bool,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        Self {
            max_bundle_span: 10_000,
            require_contiguous_blocks: true,
        }
    }
}

/// Canonical hash of a block range: the hash of the array of serialized
/// headers, each carrying its `block_hash`.
pub fn blocks_hash(blocks: &[BlockHeader]) -> ContentHash {
    canonical_hash(&Value::Array(
        blocks
            .iter()
            .map(|b| Value::Object(b.to_record()))
            .collect(),
    ))
}

pub fn state_hash(snapshot: &Value) -> ContentHash {
    canonical_hash(snapshot)
}

/// `blocks` are exactly heights `start..=end`, in order.
fn covers_range(blocks: &[BlockHeader], start: u64, end: u64) -> bool {
    let expected_len = end.checked_sub(start).and_then(|span| span.checked_add(1));
    expected_len == Some(blocks.len() as u64)
        && blocks
            .iter()
            .zip(start..=end)
            .all(|(block, height)| block.height == height)
}

pub struct AirGappedReplicator {
    registry: Arc<FederationRegistry>,
    signer: Arc<dyn BundleSigner>,
    verifier: Arc<dyn BundleVerifier>,
    config: ReplicatorConfig,
    audit: Arc<dyn AuditSink>,
    time_source: Arc<dyn TimeSource>,
    bundles: RwLock<Vec<ArchiveBundle>>,
    verifications: RwLock<Vec<ReplayVerification>>,
}

impl AirGappedReplicator {
    /// Replicator signing with [`ContentHashSigner`].
    pub fn new(
        registry: Arc<FederationRegistry>,
        config: ReplicatorConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            registry,
            signer: Arc::new(ContentHashSigner),
            verifier: Arc::new(ContentHashSigner),
            config,
            audit,
            time_source: Arc::new(SystemTimeSource),
            bundles: RwLock::new(Vec::new()),
            verifications: RwLock::new(Vec::new()),
        }
    }

    pub fn with_signing(
        mut self,
        signer: Arc<dyn BundleSigner>,
        verifier: Arc<dyn BundleVerifier>,
    ) -> Self {
        self.signer = signer;
        self.verifier = verifier;
        self
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn registry(&self) -> &Arc<FederationRegistry> {
        &self.registry
    }

    fn emit(&self, event: FederationEvent, data: Value) {
        self.audit
            .record(AuditEvent::new(self.time_source.now(), event.as_str(), data));
    }

    fn reject_bundle(
        &self,
        source: &SiteId,
        target: &SiteId,
        reason: &str,
    ) -> Option<ArchiveBundle> {
        warn!("[sn-03] Bundle {} -> {} rejected: {}", source, target, reason);
        self.emit(
            FederationEvent::BundleRejected,
            json!({"source_site": source, "target_site": target, "reason": reason}),
        );
        None
    }

    /// Build and sign a bundle for an air-gapped target.
    ///
    /// Returns `None` (with a `bundle_rejected` audit entry) when the target
    /// is not air-gapped, a site is unknown, or the range is invalid.
    pub fn create_archive_bundle(
        &self,
        source: &SiteId,
        target: &SiteId,
        start_height: u64,
        end_height: u64,
        blocks: &[BlockHeader],
        snapshot: &Value,
    ) -> Option<ArchiveBundle> {
        if start_height > end_height {
            return self.reject_bundle(source, target, "invalid_range");
        }
        if end_height - start_height >= self.config.max_bundle_span {
            return self.reject_bundle(source, target, "range_too_large");
        }
        if self.registry.get_site(source).is_none() {
            return self.reject_bundle(source, target, "unknown_source");
        }
        let Some(target_site) = self.registry.get_site(target) else {
            return self.reject_bundle(source, target, "unknown_target");
        };
        if !target_site.is_air_gapped() {
            return self.reject_bundle(source, target, "target_not_air_gapped");
        }
        if self.config.require_contiguous_blocks && !covers_range(blocks, start_height, end_height)
        {
            return self.reject_bundle(source, target, "incomplete_block_range");
        }

        let created_at = self.time_source.now();
        let mut bundle = ArchiveBundle {
            bundle_id: canonical_hash(&json!({
                "source_site": source,
                "target_site": target,
                "start_height": start_height,
                "end_height": end_height,
                "created_at": iso8601(created_at),
            })),
            source_site: source.clone(),
            target_site: target.clone(),
            start_height,
            end_height,
            block_count: blocks.len() as u64,
            blocks_hash: blocks_hash(blocks),
            state_hash: state_hash(snapshot),
            created_at,
            signature: String::new(),
        };
        bundle.signature = match self.signer.sign(&bundle.signing_payload()) {
            Ok(signature) => signature,
            Err(e) => {
                warn!("[sn-03] Signing failed: {}", e);
                return self.reject_bundle(source, target, "signing_failed");
            }
        };

        info!(
            "[sn-03] Created bundle {} for heights {}..={} ({} blocks)",
            bundle.bundle_id, start_height, end_height, bundle.block_count
        );
        self.emit(
            FederationEvent::BundleCreated,
            json!({
                "bundle_id": bundle.bundle_id,
                "source_site": source,
                "target_site": target,
                "start_height": start_height,
                "end_height": end_height,
                "block_count": bundle.block_count,
                "bundle_hash": bundle.record_hash(),
            }),
        );
        self.bundles.write().push(bundle.clone());
        Some(bundle)
    }

    /// Check the bundle signature over its canonical content.
    pub fn verify_bundle(&self, bundle: &ArchiveBundle) -> bool {
        let valid = self
            .verifier
            .verify(&bundle.signing_payload(), &bundle.signature);
        let event = if valid {
            FederationEvent::BundleVerified
        } else {
            warn!("[sn-03] Bundle {} failed signature check", bundle.bundle_id);
            FederationEvent::BundleVerificationFailed
        };
        self.emit(event, json!({"bundle_id": bundle.bundle_id, "valid": valid}));
        valid
    }

    /// Apply a transferred bundle to its target. Nothing changes unless the
    /// signature and both content hashes match. A bundle ending below the
    /// target's recorded sync height is stale and refused; re-applying the
    /// same end height is allowed.
    pub fn apply_bundle(
        &self,
        bundle: &ArchiveBundle,
        blocks: &[BlockHeader],
        snapshot: &Value,
    ) -> bool {
        let target = self.registry.get_site(&bundle.target_site);
        let failure = if !self.verify_bundle(bundle) {
            Some("invalid_signature")
        } else if blocks_hash(blocks) != bundle.blocks_hash {
            Some("blocks_hash_mismatch")
        } else if state_hash(snapshot) != bundle.state_hash {
            Some("state_hash_mismatch")
        } else if target.is_none() {
            Some("unknown_target")
        } else if target
            .as_ref()
            .and_then(|site| site.last_sync_height)
            .is_some_and(|synced| bundle.end_height < synced)
        {
            Some("stale_bundle")
        } else {
            None
        };
        if let Some(reason) = failure {
            warn!("[sn-03] Bundle {} not applied: {}", bundle.bundle_id, reason);
            self.emit(
                FederationEvent::BundleApplyFailed,
                json!({"bundle_id": bundle.bundle_id, "reason": reason}),
            );
            return false;
        }

        if !self.registry.update_sync_status(
            &bundle.target_site,
            SyncStatus::Synced,
            Some(bundle.end_height),
            Some(bundle.state_hash),
        ) {
            return false;
        }
        info!(
            "[sn-03] Applied bundle {} to {} at height {}",
            bundle.bundle_id, bundle.target_site, bundle.end_height
        );
        self.emit(
            FederationEvent::BundleApplied,
            json!({
                "bundle_id": bundle.bundle_id,
                "target_site": bundle.target_site,
                "end_height": bundle.end_height,
                "state_hash": bundle.state_hash,
            }),
        );
        true
    }

    /// Replay `blocks` and compare the resulting state with
    /// `expected_state_hash`. Without an executor nothing is proven and the
    /// record is never valid. Blocks that are not exactly
    /// `start_height..=end_height` are not replayed and record
    /// `ExecutorFailed`.
    pub fn verify_replay(
        &self,
        site_id: &SiteId,
        start_height: u64,
        end_height: u64,
        blocks: &[BlockHeader],
        expected_state_hash: ContentHash,
        executor: Option<&dyn ReplayExecutor>,
    ) -> ReplayVerification {
        let in_range = covers_range(blocks, start_height, end_height);
        let (outcome, actual_state_hash, error) = match executor {
            None => (ReplayOutcome::NotExecuted, None, None),
            Some(_) if !in_range => {
                let error = ReplayError::RangeMismatch {
                    start: start_height,
                    end: end_height,
                };
                (ReplayOutcome::ExecutorFailed, None, Some(error.to_string()))
            }
            Some(executor) => match executor.replay(blocks) {
                Ok(actual) if actual == expected_state_hash => {
                    (ReplayOutcome::Matched, Some(actual), None)
                }
                Ok(actual) => (ReplayOutcome::Mismatched, Some(actual), None),
                Err(e) => (ReplayOutcome::ExecutorFailed, None, Some(e.to_string())),
            },
        };

        let verified_at = self.time_source.now();
        let verification = ReplayVerification {
            verification_id: canonical_hash(&json!({
                "site_id": site_id,
                "start_height": start_height,
                "end_height": end_height,
                "verified_at": iso8601(verified_at),
            })),
            site_id: site_id.clone(),
            start_height,
            end_height,
            blocks_replayed: if executor.is_some() && in_range {
                blocks.len() as u64
            } else {
                0
            },
            expected_state_hash,
            actual_state_hash,
            outcome,
            is_valid: outcome == ReplayOutcome::Matched,
            error,
            verified_at,
        };

        if verification.is_valid {
            info!(
                "[sn-03] Replay of {}..={} at {} matched",
                start_height, end_height, site_id
            );
        } else {
            warn!(
                "[sn-03] Replay of {}..={} at {} not valid: {}",
                start_height,
                end_height,
                site_id,
                outcome.as_str()
            );
        }
        self.emit(
            FederationEvent::ReplayVerified,
            json!({
                "verification_id": verification.verification_id,
                "site_id": site_id,
                "start_height": start_height,
                "end_height": end_height,
                "outcome": outcome.as_str(),
                "is_valid": verification.is_valid,
            }),
        );
        self.verifications.write().push(verification.clone());
        verification
    }

    // === QUERIES ===

    pub fn bundles(&self) -> Vec<ArchiveBundle> {
        self.bundles.read().clone()
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn verifications(&self) -> Vec<ReplayVerification> {
        self.verifications.read().clone()
    }

    pub fn verification_count(&self) -> usize {
        self.verifications.read().len()
    }

    pub fn valid_verification_count(&self) -> usize {
        self.verifications.read().iter().filter(|v| v.is_valid).count()
    }
}
