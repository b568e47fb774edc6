//! Shared fixtures for the integration flows.

use chrono::Duration;
use shared_types::{ContentHash, InMemoryAuditSink, ManualClock, ValidatorId};
use sn_01_validator_registry::{RegistryConfig, ValidatorRegistry};
use sn_02_bft_consensus::{
    BftConsensus, BlockHeader, ConsensusApi, ConsensusConfig, RegistryVotingPower,
};
use sn_03_federation::FederationCoordinator;
use sovereign_telemetry::{init_logging, TelemetryConfig};
use std::sync::{Arc, Once};

pub type Engine = BftConsensus<RegistryVotingPower>;

static LOGGING: Once = Once::new();

/// Install the subscriber once per test binary. Quiet unless
/// `SN_LOG_LEVEL` or `RUST_LOG` asks for more.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let config = TelemetryConfig::from_lookup(|key| match key {
            "SN_LOG_LEVEL" => std::env::var("SN_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .ok()
                .or_else(|| Some("warn".to_string())),
            "SN_SERVICE_NAME" => Some("sn-tests".to_string()),
            _ => std::env::var(key).ok(),
        });
        // Another harness in the same binary may have installed one first.
        let _ = init_logging(&config);
    });
}

pub struct Network {
    pub clock: Arc<ManualClock>,
    pub audit: Arc<InMemoryAuditSink>,
    pub registry: Arc<ValidatorRegistry>,
    pub consensus: Arc<Engine>,
    pub federation: FederationCoordinator,
    pub validators: Vec<ValidatorId>,
}

impl Network {
    /// One ACTIVE validator per stake, registered a second apart.
    pub fn with_stakes(stakes: &[u64]) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::at_epoch_start());
        let audit = Arc::new(InMemoryAuditSink::new());
        let registry = Arc::new(
            ValidatorRegistry::new(RegistryConfig::default(), audit.clone())
                .with_time_source(clock.clone()),
        );

        let validators = stakes
            .iter()
            .enumerate()
            .map(|(i, stake)| {
                clock.advance(Duration::seconds(1));
                let id = registry
                    .register(
                        &format!("pk-{i}"),
                        &format!("10.0.0.{i}:26656"),
                        *stake,
                        0.05,
                        "Z1",
                    )
                    .unwrap();
                assert!(registry.activate(&id));
                id
            })
            .collect();

        let consensus = Arc::new(
            Engine::new(
                Arc::new(RegistryVotingPower::new(registry.clone())),
                ConsensusConfig::default(),
                audit.clone(),
            )
            .with_time_source(clock.clone()),
        );
        let federation = FederationCoordinator::with_time_source(audit.clone(), clock.clone());
        Self {
            clock,
            audit,
            registry,
            consensus,
            federation,
            validators,
        }
    }

    /// A fresh engine over the same registry, sink and clock.
    pub fn new_engine(&self) -> Engine {
        Engine::new(
            Arc::new(RegistryVotingPower::new(self.registry.clone())),
            ConsensusConfig::default(),
            self.audit.clone(),
        )
        .with_time_source(self.clock.clone())
    }

    /// Finalize heights `1..=n` in round 0 with every validator voting.
    pub fn finalize_chain(&self, n: u64) -> Vec<BlockHeader> {
        let mut parent = ContentHash::ZERO;
        (1..=n)
            .map(|height| {
                let block = commit(
                    self.consensus.as_ref(),
                    height,
                    0,
                    parent,
                    state_root(height),
                    &self.validators,
                )
                .unwrap();
                parent = block.block_hash();
                block
            })
            .collect()
    }

    pub fn vote_rejections(&self, reason: &str) -> Vec<ValidatorId> {
        self.audit
            .events_of_type("vote_rejected")
            .into_iter()
            .filter(|e| e.data["reason"] == reason)
            .filter_map(|e| e.data["validator_id"].as_str().map(ValidatorId::from))
            .collect()
    }
}

pub fn state_root(height: u64) -> ContentHash {
    ContentHash::digest(format!("state-{height}").as_bytes())
}

/// Propose as the scheduled proposer, then prevote and precommit with
/// every voter in order. Returns the finalized block, if any.
pub fn commit<C: ConsensusApi>(
    consensus: &C,
    height: u64,
    round: u32,
    parent: ContentHash,
    state_root: ContentHash,
    voters: &[ValidatorId],
) -> Option<BlockHeader> {
    let proposer = consensus.start_round(height, round).ok()?.proposer;
    let header = consensus
        .propose_block(height, round, &proposer, parent, state_root, ContentHash::ZERO)
        .ok()??;
    let hash = header.block_hash();
    for voter in voters {
        consensus.prevote(height, round, hash, voter, "sig");
    }
    for voter in voters {
        consensus.precommit(height, round, hash, voter, "sig");
    }
    consensus.finalized_block(height)
}
