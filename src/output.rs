// ABOUTME: Operator-facing output for trigger commands.
// ABOUTME: Normal mode narrates progress, quiet mode keeps results, JSON mode emits one event per line.

use serde::Serialize;
use std::time::Instant;

/// How much the CLI says, and in which format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Progress, reports and results for a person at a terminal
    Normal,
    /// Reports and results only
    Quiet,
    /// One JSON object per line
    Json,
}

/// A JSON line. Results go to stdout, warnings and errors to stderr.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum Event<'a> {
    Report {
        lines: &'a [String],
    },
    Warning {
        message: &'a str,
    },
    Success {
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
    },
    Error {
        message: &'a str,
        code: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
    },
}

impl Event<'_> {
    fn to_stderr(&self) -> bool {
        matches!(self, Event::Warning { .. } | Event::Error { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    mode: OutputMode,
    started: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: None,
        }
    }

    /// Start measuring the command; success and error lines then carry a duration.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn duration(&self) -> Option<f64> {
        self.started.map(|t| t.elapsed().as_secs_f64())
    }

    /// Narration of what is happening. Normal mode only.
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Fleet or service report lines. Kept in quiet mode.
    pub fn report(&self, lines: &[String]) {
        if self.mode == OutputMode::Json {
            self.emit(&Event::Report { lines });
            return;
        }
        for line in lines {
            println!("{line}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.mode == OutputMode::Json {
            self.emit(&Event::Warning { message });
        } else {
            eprintln!("Warning: {message}");
        }
    }

    pub fn success(&self, message: &str) {
        match (self.mode, self.duration()) {
            (OutputMode::Json, duration_secs) => self.emit(&Event::Success {
                message,
                duration_secs,
            }),
            (OutputMode::Normal, Some(secs)) => println!("{message} ({secs:.1}s)"),
            _ => println!("{message}"),
        }
    }

    /// Report a failed command with the exit code the process will use.
    pub fn error(&self, message: &str, code: i32) {
        if self.mode == OutputMode::Json {
            self.emit(&Event::Error {
                message,
                code,
                duration_secs: self.duration(),
            });
        } else {
            eprintln!("Error: {message}");
        }
    }

    fn emit(&self, event: &Event<'_>) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode output event: {}", e);
                return;
            }
        };
        if event.to_stderr() {
            eprintln!("{json}");
        } else {
            println!("{json}");
        }
    }
}
