// ABOUTME: Fire-and-forget fleet command dispatch.
// ABOUTME: Sends deploy.fetch, deploy.checkout and deploy.restart to every node.

mod salt;

pub use salt::SaltDispatcher;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Fleet-side functions trigger can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FleetFunction {
    Fetch,
    Checkout,
    Restart,
}

impl FleetFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FleetFunction::Fetch => "deploy.fetch",
            FleetFunction::Checkout => "deploy.checkout",
            FleetFunction::Restart => "deploy.restart",
        }
    }
}

impl fmt::Display for FleetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("the dispatch command is empty")]
    EmptyCommand,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{function} dispatch exited with {status}: {stderr}")]
    Failed {
        function: FleetFunction,
        status: String,
        stderr: String,
    },
}

/// Sends a command to the fleet and returns the raw reply.
///
/// Returning means the command was handed to the fleet, not that any node
/// finished acting on it.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, function: FleetFunction, argument: &str)
    -> Result<String, DispatchError>;
}
