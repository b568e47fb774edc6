//! # Sovereign-Net Test Suite
//!
//! Cross-subsystem flows. Each crate tests itself in `#[cfg(test)]`
//! modules; this crate wires real instances together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mod.rs     # Shared harness
//!     └── flows.rs   # Registry → consensus → federation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sn-tests
//! cargo test -p sn-tests integration::flows::
//! ```

pub mod integration;
