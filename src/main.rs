// ABOUTME: Entry point for the trigger CLI application.
// ABOUTME: Loads configuration, wires the drivers, and dispatches to the orchestrator.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, ReportTarget};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trigger::config::{self, ConfigurationError};
use trigger::confirm::TerminalPrompt;
use trigger::deploy::{AbortOptions, DeploymentState, Orchestrator, Outcome, ReportKind};
use trigger::dispatch::SaltDispatcher;
use trigger::drivers::{DriverContext, DriverRegistry, SyncArgs};
use trigger::error::Result;
use trigger::git::{GitCli, Vcs};
use trigger::output::{Output, OutputMode};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    output.start_timer();

    if let Err(e) = run(cli, &output).await {
        tracing::debug!(error = ?e, "Command failed");
        let code = e.exit_code();
        output.error(&e.to_string(), code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let git = GitCli::discover(&cwd)
        .await
        .map_err(|e| ConfigurationError::NotARepository(e.to_string()))?;

    let config = config::load(&git).await?;
    config.check()?;
    config::check_umask(&config)?;

    let repo = config.repo_name()?;
    let user = config.user_name()?.to_string();
    let git_dir = git.git_dir().await?;
    let dispatcher = SaltDispatcher::new(config.dispatch_command())?;
    let vcs: Arc<dyn Vcs> = Arc::new(git);

    let ctx = DriverContext {
        config: Arc::new(config),
        repo: repo.clone(),
        user: user.clone(),
        git_dir,
        vcs: vcs.clone(),
        dispatcher: Arc::new(dispatcher),
    };
    let drivers = DriverRegistry::builtin().load(&ctx)?;

    let orchestrator = Orchestrator::new(
        repo,
        user,
        vcs,
        drivers,
        Arc::new(TerminalPrompt::new()),
        output.clone(),
    );

    match cli.command {
        Commands::Start => {
            let outcome = orchestrator.start().await?;
            conclude(output, outcome, "Deployment started");
        }
        Commands::Abort { noreset, force } => {
            let outcome = orchestrator
                .abort(AbortOptions { noreset, force })
                .await?;
            conclude(output, outcome, "Deployment aborted");
        }
        Commands::Sync { force } => {
            let outcome = orchestrator.sync(SyncArgs { force }).await?;
            let message = match &outcome.state {
                DeploymentState::Synced(tag) => format!("Synced {tag}"),
                _ => "Sync complete".to_string(),
            };
            conclude(output, outcome, &message);
        }
        Commands::Finish => {
            let outcome = orchestrator.finish().await?;
            conclude(output, outcome, "Deployment finished");
        }
        Commands::Service { action, batch } => {
            let report = orchestrator.service(&action, batch).await?;
            output.report(&report.lines());
            output.success(&format!("Service {action} dispatched"));
        }
        Commands::Report { target, detailed } => {
            let kind = match target {
                ReportTarget::Sync => ReportKind::Sync,
                ReportTarget::Service => ReportKind::Service,
            };
            let report = orchestrator.report(kind, detailed).await?;
            output.report(&report.lines());
        }
        Commands::Status => match orchestrator.state().await {
            DeploymentState::Started(info) => output.success(&format!(
                "Deployment of {} in progress, started by {}",
                orchestrator.repo(),
                info.describe_holder()
            )),
            _ => output.success(&format!(
                "No deployment of {} in progress",
                orchestrator.repo()
            )),
        },
    }

    Ok(())
}

/// Print collected warnings, then the success message.
fn conclude(output: &Output, outcome: Outcome, message: &str) {
    for warning in outcome.diagnostics.warnings() {
        output.warning(&warning.message);
    }
    output.success(message);
}
