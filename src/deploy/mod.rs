// ABOUTME: Deployment orchestration: the lock-guarded top-level state machine.
// ABOUTME: Exports the orchestrator, its states, and its error type.

mod error;
mod orchestrator;

pub use error::{OrchestratorError, OrchestratorErrorKind};
pub use orchestrator::{AbortOptions, DeploymentState, Orchestrator, Outcome, ReportKind};
