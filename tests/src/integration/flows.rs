//! # Integration Test Flows
//!
//! Finalized blocks flow from the registry-backed BFT engine into the
//! federation layer and are archived to an air-gapped Z3 vault.
//!
//! ## Flows Tested:
//!
//! 1. **Registry (1) → Consensus (2)**: voting power and proposer rotation
//!    come from the live validator set
//! 2. **Consensus (2) → Federation (3)**: finalized headers are bundled,
//!    applied at the vault and replayed
//! 3. **Slashing mid-flow**: a jailed validator loses its vote on the next
//!    height and regains it after unjail

use super::harness::{commit, state_root, Network};
use chrono::Duration;
use serde_json::json;
use shared_types::ContentHash;
use sn_01_validator_registry::{SlashingReason, ValidatorStatus};
use sn_02_bft_consensus::{
    ConsensusApi, TimeoutDriver, TrajectoryAwareConsensus, TrajectoryConfig,
};
use sn_03_federation::{
    state_hash, AirGappedReplicator, HeaderChainExecutor, HmacBundleSigner, ReplayOutcome,
    ReplicatorConfig, SyncStatus,
};
use std::sync::Arc;

// =============================================================================
// REGISTRY → CONSENSUS → FEDERATION
// =============================================================================

#[test]
fn test_finalized_chain_archived_to_vault() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let blocks = net.finalize_chain(3);
    assert_eq!(net.consensus.latest_finalized_height(), Some(3));
    assert_eq!(blocks[1].parent_hash, blocks[0].block_hash());

    net.clock.advance(Duration::seconds(1));
    let primary = net
        .federation
        .register_primary_site("hq", "pk-hq", "https://hq.internal", "Z1")
        .unwrap();
    net.clock.advance(Duration::seconds(1));
    let vault = net
        .federation
        .register_air_gapped_archive("vault", "pk-vault")
        .unwrap();

    let snapshot = json!({"height": 3, "accounts": {"treasury": 1_000_000}});
    let bundle = net
        .federation
        .create_z3_archive_bundle(&vault, 1, 3, &blocks, &snapshot)
        .unwrap();
    assert_eq!(bundle.source_site, primary);
    assert_eq!(bundle.block_count, 3);
    assert!(net.federation.verify_z3_archive(&bundle));

    // Carried across the gap and applied on the vault side.
    assert!(net
        .federation
        .replicator()
        .apply_bundle(&bundle, &blocks, &snapshot));
    let site = net.federation.registry().get_site(&vault).unwrap();
    assert_eq!(site.sync_status, SyncStatus::Synced);
    assert_eq!(site.last_sync_height, Some(3));
    assert_eq!(site.last_state_hash, Some(state_hash(&snapshot)));

    let replay = net.federation.replicator().verify_replay(
        &vault,
        1,
        3,
        &blocks,
        state_root(3),
        Some(&HeaderChainExecutor),
    );
    assert_eq!(replay.outcome, ReplayOutcome::Matched);
    assert!(replay.is_valid);

    let status = net.federation.federation_status();
    assert_eq!(status.bundles_created, 1);
    assert_eq!(status.valid_replay_verifications, 1);
    assert_eq!(status.healthy_sites, 1);
    assert_eq!(status.air_gapped_sites, 1);
}

#[test]
fn test_replay_without_executor_is_not_proof() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let blocks = net.finalize_chain(2);
    let vault = net
        .federation
        .register_air_gapped_archive("vault", "pk-vault")
        .unwrap();

    let replay =
        net.federation
            .replicator()
            .verify_replay(&vault, 1, 2, &blocks, state_root(2), None);
    assert_eq!(replay.outcome, ReplayOutcome::NotExecuted);
    assert!(!replay.is_valid);
    assert_eq!(net.federation.federation_status().valid_replay_verifications, 0);
}

#[test]
fn test_tampered_chain_fails_apply_and_replay() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let blocks = net.finalize_chain(3);
    net.federation
        .register_primary_site("hq", "pk-hq", "https://hq.internal", "Z1")
        .unwrap();
    net.clock.advance(Duration::seconds(1));
    let vault = net
        .federation
        .register_air_gapped_archive("vault", "pk-vault")
        .unwrap();
    let snapshot = json!({"height": 3});
    let bundle = net
        .federation
        .create_z3_archive_bundle(&vault, 1, 3, &blocks, &snapshot)
        .unwrap();

    let mut forged = blocks.clone();
    forged[1].state_root = ContentHash::digest(b"forged");
    assert!(!net
        .federation
        .replicator()
        .apply_bundle(&bundle, &forged, &snapshot));

    // Block 3 still names the real block 2 as its parent.
    let replay = net.federation.replicator().verify_replay(
        &vault,
        1,
        3,
        &forged,
        state_root(3),
        Some(&HeaderChainExecutor),
    );
    assert_eq!(replay.outcome, ReplayOutcome::ExecutorFailed);
    assert!(replay.error.is_some());
    assert_eq!(
        net.federation.registry().get_site(&vault).unwrap().sync_status,
        SyncStatus::Pending
    );
}

#[test]
fn test_shared_key_sites_authenticate_bundles() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let blocks = net.finalize_chain(1);
    let federation = sn_03_federation::FederationCoordinator::with_time_source(
        net.audit.clone(),
        net.clock.clone(),
    )
    .with_signing(
        Arc::new(HmacBundleSigner::new(b"federation-key".to_vec())),
        Arc::new(HmacBundleSigner::new(b"federation-key".to_vec())),
    );
    federation
        .register_primary_site("hq", "pk-hq", "https://hq.internal", "Z1")
        .unwrap();
    net.clock.advance(Duration::seconds(1));
    let vault = federation
        .register_air_gapped_archive("vault", "pk-vault")
        .unwrap();
    let bundle = federation
        .create_z3_archive_bundle(&vault, 1, 1, &blocks, &json!({}))
        .unwrap();

    let keyed_vault = AirGappedReplicator::new(
        federation.registry().clone(),
        ReplicatorConfig::default(),
        net.audit.clone(),
    )
    .with_signing(
        Arc::new(HmacBundleSigner::new(b"federation-key".to_vec())),
        Arc::new(HmacBundleSigner::new(b"federation-key".to_vec())),
    );
    let wrong_key_vault = AirGappedReplicator::new(
        federation.registry().clone(),
        ReplicatorConfig::default(),
        net.audit.clone(),
    )
    .with_signing(
        Arc::new(HmacBundleSigner::new(b"other-key".to_vec())),
        Arc::new(HmacBundleSigner::new(b"other-key".to_vec())),
    );

    assert!(keyed_vault.verify_bundle(&bundle));
    assert!(!wrong_key_vault.verify_bundle(&bundle));
    assert!(!wrong_key_vault.apply_bundle(&bundle, &blocks, &json!({})));
}

// =============================================================================
// SLASHING MID-FLOW
// =============================================================================

#[test]
fn test_jailed_validator_loses_vote_on_next_height() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let first = net.finalize_chain(1).remove(0);
    let offender = net.validators[0].clone();

    let event = net
        .registry
        .slash(
            &offender,
            SlashingReason::DoubleSigning,
            json!({"height": 1, "conflicting": ["a", "b"]}),
        )
        .unwrap();
    assert_eq!(event.stake_after, 38_000);
    assert_eq!(
        net.registry.get_validator(&offender).unwrap().status,
        ValidatorStatus::Jailed
    );
    assert_eq!(net.registry.total_voting_power(), 60_000);

    let second = commit(
        net.consensus.as_ref(),
        2,
        0,
        first.block_hash(),
        state_root(2),
        &net.validators,
    )
    .unwrap();
    assert_ne!(second.proposer, offender);
    // Prevote and precommit both refused.
    assert_eq!(net.vote_rejections("no_voting_power"), vec![offender.clone(); 2]);

    // The jail term is one epoch.
    assert!(!net.registry.unjail(&offender));
    net.registry.advance_epoch();
    assert!(net.registry.unjail(&offender));
    assert_eq!(net.registry.total_voting_power(), 98_000);

    commit(
        net.consensus.as_ref(),
        3,
        0,
        second.block_hash(),
        state_root(3),
        &net.validators,
    )
    .unwrap();
    assert_eq!(net.vote_rejections("no_voting_power").len(), 2);
    assert_eq!(net.consensus.latest_finalized_height(), Some(3));
}

#[test]
fn test_slashed_validators_drop_out_of_quorum() {
    let net = Network::with_stakes(&[50_000, 25_000, 25_000]);
    net.finalize_chain(1);
    for id in &net.validators[1..] {
        net.registry
            .slash(id, SlashingReason::InvariantViolation, json!({}))
            .unwrap();
    }
    assert_eq!(
        net.registry.get_validator(&net.validators[1]).unwrap().status,
        ValidatorStatus::Slashed
    );

    // The remaining validator holds all voting power and finalizes alone.
    // Slashed validators vote first so they reach the power check.
    let voters: Vec<_> = net.validators.iter().rev().cloned().collect();
    let block = commit(
        net.consensus.as_ref(),
        2,
        0,
        ContentHash::ZERO,
        state_root(2),
        &voters,
    )
    .unwrap();
    assert_eq!(block.proposer, net.validators[0]);
    assert_eq!(net.vote_rejections("no_voting_power").len(), 4);
}

// =============================================================================
// LIVENESS
// =============================================================================

#[test]
fn test_suspension_halts_proposals_until_recovery() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let guarded = TrajectoryAwareConsensus::new(
        net.new_engine(),
        TrajectoryConfig::default(),
        net.audit.clone(),
    )
    .with_time_source(net.clock.clone());

    guarded.update_trajectory_metrics(0.2, 0.8, vec!["validator_churn".to_string()]);
    assert!(guarded.is_suspended());
    assert!(commit(
        &guarded,
        1,
        0,
        ContentHash::ZERO,
        state_root(1),
        &net.validators
    )
    .is_none());
    assert_eq!(net.audit.events_of_type("proposal_blocked_suspended").len(), 1);
    assert!(!guarded.resume_consensus());

    guarded.update_trajectory_metrics(0.95, 0.05, Vec::new());
    assert!(guarded.resume_consensus());
    let block = commit(
        &guarded,
        1,
        0,
        ContentHash::ZERO,
        state_root(1),
        &net.validators,
    )
    .unwrap();
    assert_eq!(guarded.finalized_block(1), Some(block));
}

#[tokio::test(start_paused = true)]
async fn test_silent_proposer_times_out_to_next_in_rotation() {
    let net = Network::with_stakes(&[40_000, 30_000, 30_000]);
    let first_proposer = net.consensus.start_round(1, 0).unwrap().proposer;

    let mut handle = TimeoutDriver::new(net.consensus.clone(), std::time::Duration::from_secs(1))
        .spawn(1, 0);
    net.clock.advance(Duration::seconds(31));
    handle.rounds.changed().await.unwrap();
    assert_eq!(handle.current_round(), 1);

    let block = commit(
        net.consensus.as_ref(),
        1,
        1,
        ContentHash::ZERO,
        state_root(1),
        &net.validators,
    )
    .unwrap();
    assert_eq!(block.round, 1);
    assert_ne!(block.proposer, first_proposer);

    let finalized = handle.finished().await.unwrap();
    assert_eq!(finalized.round, 1);
    assert_eq!(net.audit.events_of_type("round_timeout").len(), 1);
}
