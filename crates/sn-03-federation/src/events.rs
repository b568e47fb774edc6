//! Audit event types emitted by the federation layer

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FederationEvent {
    SiteRegistered,
    SyncStatusUpdated,
    SyncStatusRejected,
    BundleCreated,
    BundleRejected,
    BundleVerified,
    BundleVerificationFailed,
    BundleApplied,
    BundleApplyFailed,
    ReplayVerified,
}

impl FederationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SiteRegistered => "site_registered",
            Self::SyncStatusUpdated => "sync_status_updated",
            Self::SyncStatusRejected => "sync_status_rejected",
            Self::BundleCreated => "bundle_created",
            Self::BundleRejected => "bundle_rejected",
            Self::BundleVerified => "bundle_verified",
            Self::BundleVerificationFailed => "bundle_verification_failed",
            Self::BundleApplied => "bundle_applied",
            Self::BundleApplyFailed => "bundle_apply_failed",
            Self::ReplayVerified => "replay_verified",
        }
    }
}
