//! Deep-Sea Nexus tools - library side of the two binaries, exposed for testing.

pub mod commands;
pub mod common;
pub mod errors;
