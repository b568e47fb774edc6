//! Domain layer for federation
//!
//! - site: site identity, type, sync status and replication mode
//! - bundle: archive bundles and replay verification records

mod bundle;
mod error;
mod site;

pub use bundle::*;
pub use error::*;
pub use site::*;
