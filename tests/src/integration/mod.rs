//! Cross-subsystem flows.
//!
//! A [`harness::Network`] wires a real validator registry, BFT engine and
//! federation coordinator to one audit sink and one manual clock.

#[cfg(test)]
mod flows;
#[cfg(test)]
mod harness;
