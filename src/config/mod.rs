// ABOUTME: Resolved trigger configuration merged from ordered layers.
// ABOUTME: Resolved once per process and shared read-only with every driver.

mod error;
pub mod keys;
mod layer;
mod load;
mod umask;

pub use error::ConfigurationError;
pub use keys::{ConfigKey, KEYS};
pub use layer::{ConfigLayer, LayerLevel, TRIGGER_FILE};
pub use load::load;
pub use umask::{check_umask, process_umask};

use crate::types::RepoName;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Config {
    values: BTreeMap<String, String>,
    missing: Vec<String>,
}

impl Config {
    /// Merge `layers` so the most specific level wins, then apply defaults
    /// for every registered key that no layer sets.
    pub fn resolve(layers: &[ConfigLayer]) -> Self {
        let mut ordered: Vec<&ConfigLayer> = layers.iter().collect();
        ordered.sort_by_key(|layer| layer.level);

        let mut values = BTreeMap::new();
        for layer in ordered {
            for (key, value) in &layer.values {
                values.insert(key.clone(), value.clone());
            }
        }

        let mut missing = Vec::new();
        for key in KEYS {
            if values.contains_key(key.name) {
                continue;
            }
            match key.default {
                Some(default) => {
                    values.insert(key.name.to_string(), default.to_string());
                }
                None if key.required => missing.push(key.name.to_string()),
                None => {}
            }
        }

        Self { values, missing }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Required keys that no layer sets.
    pub fn required_missing(&self) -> &[String] {
        &self.missing
    }

    pub fn check(&self) -> Result<(), ConfigurationError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        for key in &self.missing {
            tracing::error!("Missing the following configuration item: {}", key);
        }
        Err(ConfigurationError::MissingKeys(self.missing.clone()))
    }

    fn required(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.get(key)
            .ok_or_else(|| ConfigurationError::MissingKeys(vec![key.to_string()]))
    }

    pub fn repo_name(&self) -> Result<RepoName, ConfigurationError> {
        let raw = self.required(keys::REPO_NAME)?;
        RepoName::new(raw).map_err(|e| ConfigurationError::InvalidValue {
            key: keys::REPO_NAME.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn user_name(&self) -> Result<&str, ConfigurationError> {
        self.required(keys::USER_NAME)
    }

    pub fn user_email(&self) -> Result<&str, ConfigurationError> {
        self.required(keys::USER_EMAIL)
    }

    pub fn checkout_submodules(&self) -> Result<bool, ConfigurationError> {
        match self.get(keys::CHECKOUT_SUBMODULES) {
            None => Ok(false),
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigurationError::InvalidValue {
                key: keys::CHECKOUT_SUBMODULES.to_string(),
                reason: format!("expected a boolean, got '{raw}'"),
            }),
        }
    }

    /// The umask the deployer must run with, parsed as octal.
    pub fn required_umask(&self) -> Result<Option<u32>, ConfigurationError> {
        let Some(raw) = self.get(keys::REQUIRED_UMASK) else {
            return Ok(None);
        };
        u32::from_str_radix(raw.trim(), 8)
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidValue {
                key: keys::REQUIRED_UMASK.to_string(),
                reason: format!("expected an octal umask, got '{raw}'"),
            })
    }

    /// Driver family configured under `key`, `local` when unset.
    pub fn driver(&self, key: &str) -> &str {
        self.get(key).unwrap_or(keys::DEFAULT_DRIVER)
    }

    pub fn status_store_url(&self) -> &str {
        self.get(keys::STATUS_STORE_URL)
            .unwrap_or("redis://127.0.0.1:6379")
    }

    /// Program and leading arguments of the fleet dispatch command.
    pub fn dispatch_command(&self) -> Vec<String> {
        self.get(keys::DISPATCH_COMMAND)
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Boolean spelling accepted by git config.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}
