//! # Sovereign Telemetry
//!
//! Logging bootstrap shared by Sovereign-Net binaries and test harnesses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sovereign_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), sovereign_telemetry::TelemetryError> {
//!     init_logging(&TelemetryConfig::for_subsystem("02", "bft-consensus"))?;
//!     // `[sn-02]` log lines are now emitted
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SN_SERVICE_NAME` | `sovereign-net` | Service name in log lines |
//! | `SN_SUBSYSTEM_ID` | `00` | Subsystem identifier |
//! | `SN_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SN_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `SN_NETWORK` | `devnet` | Network name |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
