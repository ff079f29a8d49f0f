// ABOUTME: Batch selector for fleet-wide service actions.
// ABOUTME: Either an absolute node count ("10") or a percentage ("10%").

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchSpecError {
    #[error("batch size cannot be empty")]
    Empty,

    #[error("invalid batch size '{0}', expected a number or a percentage like 10%")]
    Invalid(String),

    #[error("batch size must be at least 1")]
    Zero,

    #[error("batch percentage must be between 1% and 100%, got {0}%")]
    PercentOutOfRange(u32),
}

/// How many nodes a service action should target at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSpec {
    Count(u32),
    Percent(u8),
}

impl FromStr for BatchSpec {
    type Err = BatchSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BatchSpecError::Empty);
        }

        if let Some(percent) = s.strip_suffix('%') {
            let value: u32 = percent
                .trim()
                .parse()
                .map_err(|_| BatchSpecError::Invalid(s.to_string()))?;
            return match u8::try_from(value) {
                Ok(p) if (1..=100).contains(&p) => Ok(BatchSpec::Percent(p)),
                _ => Err(BatchSpecError::PercentOutOfRange(value)),
            };
        }

        match s.parse::<u32>() {
            Ok(0) => Err(BatchSpecError::Zero),
            Ok(n) => Ok(BatchSpec::Count(n)),
            Err(_) => Err(BatchSpecError::Invalid(s.to_string())),
        }
    }
}

impl fmt::Display for BatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSpec::Count(n) => write!(f, "{n}"),
            BatchSpec::Percent(p) => write!(f, "{p}%"),
        }
    }
}
