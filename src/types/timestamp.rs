// ABOUTME: Second-resolution deployment timestamp in YYYYMMDD-HHMMSS form.
// ABOUTME: Shared by tag names, the lock file, and the deploy record.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format used for every timestamp written by trigger.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Length of a formatted timestamp, e.g. `20240101-000000`.
pub const TIMESTAMP_LEN: usize = 15;

#[derive(Debug, Error)]
#[error("invalid timestamp '{input}', expected YYYYMMDD-HHMMSS")]
pub struct ParseTimestampError {
    input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeployTimestamp(NaiveDateTime);

impl DeployTimestamp {
    /// Current local time, truncated to whole seconds.
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn parse(input: &str) -> Result<Self, ParseTimestampError> {
        // chrono accepts shorter numeric fields, the tag format does not.
        if input.len() != TIMESTAMP_LEN {
            return Err(ParseTimestampError {
                input: input.to_string(),
            });
        }
        NaiveDateTime::parse_from_str(input, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| ParseTimestampError {
                input: input.to_string(),
            })
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for DeployTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }
}

impl FromStr for DeployTimestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeployTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for DeployTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeployTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
