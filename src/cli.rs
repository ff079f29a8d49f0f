// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use trigger::types::BatchSpec;

#[derive(Parser)]
#[command(name = "trigger")]
#[command(about = "Tag-based deployments driven from a git working copy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a deployment: take the lock and write a start tag
    Start,

    /// Abort the current deployment and release the lock
    Abort {
        /// Do not reset the working tree to the start tag
        #[arg(long)]
        noreset: bool,

        /// Abort even if another user holds the lock
        #[arg(long)]
        force: bool,
    },

    /// Tag the working tree and push it to the fleet
    Sync {
        /// Check out on nodes even over local modifications
        #[arg(long)]
        force: bool,
    },

    /// Finish the current deployment and release the lock
    Finish,

    /// Run a service action (stop, start, restart, reload) on the fleet
    Service {
        /// Action to take
        action: String,

        /// Nodes per batch, as a count or a percentage (e.g. 10%)
        #[arg(short, long)]
        batch: Option<BatchSpec>,
    },

    /// Report fleet progress
    Report {
        /// What to report on
        #[arg(value_enum)]
        target: ReportTarget,

        /// Include a line per node
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show whether a deployment is in progress
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportTarget {
    Sync,
    Service,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_service_batch() {
        let cli = Cli::try_parse_from(["trigger", "service", "restart", "--batch", "10%"]).unwrap();
        match cli.command {
            Commands::Service { action, batch } => {
                assert_eq!(action, "restart");
                assert_eq!(batch, Some(BatchSpec::Percent(10)));
            }
            _ => panic!("expected service command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["trigger", "abort", "--noreset", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Abort {
                noreset: true,
                force: false
            }
        ));
    }

    #[test]
    fn quiet_and_json_conflict() {
        assert!(Cli::try_parse_from(["trigger", "--quiet", "--json", "finish"]).is_err());
    }
}
