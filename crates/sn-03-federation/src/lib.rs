//! # sn-03-federation
//!
//! Federation subsystem for Sovereign-Net: the set of sites that hold a
//! copy of the chain, and the manual replication path to sites with no
//! network connectivity (zone Z3).
//!
//! ## Architecture
//!
//! ```text
//! BftConsensus (2) ──finalized BlockHeaders──→ FederationCoordinator
//!                                                ├── FederationRegistry   (sites, sync status, primary)
//!                                                └── AirGappedReplicator  (bundles, signatures, replay)
//!                                                       ├── BundleSigner / BundleVerifier
//!                                                       └── ReplayExecutor
//! ```
//!
//! ## Integrity
//!
//! - Bundle content hashes are canonical (sorted-key JSON, SHA-256)
//! - Signatures come from an injected signer; [`ContentHashSigner`] is
//!   integrity-only, [`HmacBundleSigner`] authenticates with a shared key
//! - A replay without an executor is recorded as `not_executed` and is
//!   never valid

pub mod coordinator;
pub mod domain;
pub mod events;
pub mod registry;
pub mod replicator;
pub mod signing;

pub use coordinator::{FederationCoordinator, FederationStatus};
pub use domain::{
    ArchiveBundle, FederationError, FederationResult, FederationSite, ReplayError,
    ReplayOutcome, ReplayVerification, ReplicationMode, SiteCredentials, SiteType, SyncStatus,
    AIR_GAPPED_ZONE,
};
pub use events::FederationEvent;
pub use registry::FederationRegistry;
pub use replicator::{
    blocks_hash, state_hash, AirGappedReplicator, HeaderChainExecutor, ReplayExecutor,
    ReplicatorConfig,
};
pub use signing::{BundleSigner, BundleVerifier, ContentHashSigner, HmacBundleSigner};
