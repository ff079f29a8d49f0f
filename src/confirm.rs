// ABOUTME: Human-in-the-loop confirmation between dispatching a fleet stage and trusting it.
// ABOUTME: Terminal and scripted answer sources plus the report-then-ask gate.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::drivers::ReportDriver;
use crate::fleet::SyncScope;
use crate::output::Output;

const PROMPT: &str = "Continue? ([d]etailed/[C]oncise report,[y]es,[n]o,[r]etry): ";

/// Fleet stage awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Checkout,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Checkout => "checkout",
        }
    }
}

impl From<Stage> for SyncScope {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Fetch => SyncScope::Fetch,
            Stage::Checkout => SyncScope::Checkout,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator reply at the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Concise,
    Detailed,
    Yes,
    No,
    Retry,
}

impl Answer {
    /// Parse one line of input. Empty input selects the concise report.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "" | "c" | "C" => Some(Answer::Concise),
            "d" | "D" => Some(Answer::Detailed),
            "y" | "Y" => Some(Answer::Yes),
            "n" | "N" => Some(Answer::No),
            "r" | "R" => Some(Answer::Retry),
            _ => None,
        }
    }
}

/// Source of operator answers.
#[async_trait]
pub trait ConfirmationSource: Send + Sync {
    /// Block until the operator answers for `stage`.
    async fn answer(&self, stage: Stage) -> Answer;
}

/// Reads answers from standard input. End of input counts as "no".
pub struct TerminalPrompt {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationSource for TerminalPrompt {
    async fn answer(&self, stage: Stage) -> Answer {
        let mut lines = self.lines.lock().await;
        loop {
            let mut stdout = tokio::io::stdout();
            let _ = stdout.write_all(PROMPT.as_bytes()).await;
            let _ = stdout.flush().await;

            match lines.next_line().await {
                Ok(Some(line)) => match Answer::parse(&line) {
                    Some(answer) => return answer,
                    None => tracing::debug!("Unrecognised answer at {} prompt: {:?}", stage, line),
                },
                Ok(None) => return Answer::No,
                Err(e) => {
                    tracing::warn!("Failed to read confirmation: {}", e);
                    return Answer::No;
                }
            }
        }
    }
}

/// Replays a fixed list of answers. Once exhausted every answer is "no".
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<Stage>>,
}

impl ScriptedConfirmation {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Stages in the order they were asked about.
    pub fn stages_asked(&self) -> Vec<Stage> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl ConfirmationSource for ScriptedConfirmation {
    async fn answer(&self, stage: Stage) -> Answer {
        self.asked.lock().push(stage);
        self.answers.lock().pop_front().unwrap_or(Answer::No)
    }
}

/// Outcome of one confirmation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Reject,
    Retry,
}

/// Shows fleet progress for a stage and asks the operator whether to advance.
pub struct ConfirmationGate<'a> {
    report: &'a dyn ReportDriver,
    source: &'a dyn ConfirmationSource,
    output: &'a Output,
}

impl<'a> ConfirmationGate<'a> {
    pub fn new(
        report: &'a dyn ReportDriver,
        source: &'a dyn ConfirmationSource,
        output: &'a Output,
    ) -> Self {
        Self {
            report,
            source,
            output,
        }
    }

    /// Report on `stage` for `tag`, then loop on operator input until a verdict.
    ///
    /// There is no timeout. Report failures are shown as warnings and do not
    /// end the loop.
    pub async fn ask(&self, stage: Stage, tag: &str) -> Verdict {
        self.show(stage, tag, false).await;
        loop {
            match self.source.answer(stage).await {
                Answer::Concise => self.show(stage, tag, false).await,
                Answer::Detailed => self.show(stage, tag, true).await,
                Answer::Yes => return Verdict::Proceed,
                Answer::No => return Verdict::Reject,
                Answer::Retry => return Verdict::Retry,
            }
        }
    }

    async fn show(&self, stage: Stage, tag: &str, detailed: bool) {
        match self.report.report_sync(tag, stage.into(), detailed).await {
            Ok(report) => self.output.report(&report.lines()),
            Err(e) => {
                tracing::warn!("Failed to report {} progress: {}", stage, e);
                self.output.warning(&format!("{stage} report unavailable: {e}"));
            }
        }
    }
}
