//! Domain layer for BFT Consensus
//!
//! - block: content-addressed block header
//! - vote: prevote / precommit records
//! - round: round phases and weighted quorum

mod block;
mod config;
mod error;
mod round;
mod vote;

pub use block::*;
pub use config::*;
pub use error::*;
pub use round::*;
pub use vote::*;
