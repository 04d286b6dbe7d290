//! End-to-end test support for linkwheel
//!
//! Provides the vault/engine harness and deterministic fixture generation
//! used by the integration suites.

pub mod harness;
