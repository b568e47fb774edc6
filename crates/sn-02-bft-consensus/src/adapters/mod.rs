//! Adapters layer (Hexagonal Architecture)
//!
//! - registry: `VotingPowerSource` implementations
//! - timeout_driver: tokio task that polls round timeouts

mod registry;
mod timeout_driver;

pub use registry::*;
pub use timeout_driver::*;
