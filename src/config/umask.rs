// ABOUTME: Enforcement of deploy.required-umask.
// ABOUTME: Reads the process umask from /proc/self/status.

use super::{Config, ConfigurationError};

/// The umask of the current process, if the platform exposes it.
pub fn process_umask() -> Option<u32> {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| parse_status_umask(&status))
}

fn parse_status_umask(status: &str) -> Option<u32> {
    status
        .lines()
        .find(|l| l.starts_with("Umask:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| u32::from_str_radix(v, 8).ok())
}

/// Fail if a required umask is configured and the process umask differs.
pub fn check_umask(config: &Config) -> Result<(), ConfigurationError> {
    let Some(required) = config.required_umask()? else {
        return Ok(());
    };
    let actual = process_umask().ok_or(ConfigurationError::UmaskUnknown)?;
    check_against(required, actual)
}

fn check_against(required: u32, actual: u32) -> Result<(), ConfigurationError> {
    if required == actual {
        Ok(())
    } else {
        Err(ConfigurationError::UmaskMismatch { required, actual })
    }
}
