// ABOUTME: Dispatcher that publishes deploy runner calls through salt-call.
// ABOUTME: The command prefix comes from deploy.dispatch-command.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{CommandDispatcher, DispatchError, FleetFunction};

#[derive(Debug, Clone)]
pub struct SaltDispatcher {
    program: String,
    args: Vec<String>,
}

impl SaltDispatcher {
    /// Build from the configured command, e.g.
    /// `sudo salt-call -l quiet --out=json publish.runner`.
    pub fn new(command: Vec<String>) -> Result<Self, DispatchError> {
        let mut parts = command.into_iter();
        let program = parts.next().ok_or(DispatchError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Full argument list passed to the program for one call.
    pub fn arguments(&self, function: FleetFunction, argument: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(function.as_str().to_string());
        args.push(argument.to_string());
        args
    }
}

#[async_trait]
impl CommandDispatcher for SaltDispatcher {
    async fn dispatch(
        &self,
        function: FleetFunction,
        argument: &str,
    ) -> Result<String, DispatchError> {
        let args = self.arguments(function, argument);
        tracing::debug!(program = %self.program, args = ?args, "Dispatching fleet command");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| DispatchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DispatchError::Failed {
                function,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
