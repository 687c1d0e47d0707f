//! Helpers for tests of the engine and of crates built on it.
pub mod canned_transport;
pub mod fixtures;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
