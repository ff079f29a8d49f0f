// ABOUTME: Configuration error type, fatal at startup.
// ABOUTME: Covers missing keys, invalid values, layer parse failures, and driver loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("not in a git repository: {0}")]
    NotARepository(String),

    #[error(
        "missing required configuration: {}. Please add the missing items via git config or in the .trigger file",
        .0.join(", ")
    )]
    MissingKeys(Vec<String>),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("unknown {role} driver: {name}")]
    UnknownDriver { role: &'static str, name: String },

    #[error("failed to load {role} driver: {reason}")]
    DriverLoad { role: &'static str, reason: String },

    #[error("umask {actual:04o} does not match the required umask {required:04o}")]
    UmaskMismatch { required: u32, actual: u32 },

    #[error("the process umask could not be determined, but deploy.required-umask is set")]
    UmaskUnknown,
}

impl ConfigurationError {
    /// Process exit code for configuration failures.
    pub fn code(&self) -> i32 {
        1
    }
}
