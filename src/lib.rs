// ABOUTME: Library root for roughneck - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod probe;
pub mod prompt;
pub mod providers;
pub mod provision;
pub mod types;
