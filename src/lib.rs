// ABOUTME: Library root for trigger - exposes the orchestrator, drivers and collaborators.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod confirm;
pub mod deploy;
pub mod diagnostics;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod fleet;
pub mod git;
pub mod output;
pub mod types;
