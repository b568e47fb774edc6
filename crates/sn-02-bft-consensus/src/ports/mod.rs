//! Hexagonal ports
//!
//! - inbound: the API consensus offers (`ConsensusApi`)
//! - outbound: what consensus needs from the outside (`VotingPowerSource`)

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
