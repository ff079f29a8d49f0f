// ABOUTME: Non-fatal problems met while a deployment step still succeeds.
// ABOUTME: Each warning is logged when recorded and handed back to the caller for display.

use std::fmt;

/// Warnings gathered by one orchestrator operation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record `warning` and log it.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of warnings of `kind`.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn reset_failed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ResetFailed, message)
    }

    pub fn server_info(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ServerInfo, message)
    }

    pub fn submodule_publish(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SubmodulePublish, message)
    }

    pub fn unknown_holder(message: impl Into<String>) -> Self {
        Self::new(WarningKind::UnknownHolder, message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What went wrong, for callers that react to specific warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Working tree left where it was on abort.
    ResetFailed,
    /// Repository server info not regenerated; nodes may not see the new tag.
    ServerInfo,
    /// One submodule not tagged or republished.
    SubmodulePublish,
    /// Lock file exists but names no holder.
    UnknownHolder,
}
