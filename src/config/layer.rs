// ABOUTME: Configuration layers in precedence order.
// ABOUTME: Parses `git config --list` output and the per-repository .trigger YAML file.

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the per-repository configuration file in the work tree root.
pub const TRIGGER_FILE: &str = ".trigger";

/// Where a configuration value came from, least specific first.
///
/// When a key is set at several levels the most specific level wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerLevel {
    System,
    Global,
    TriggerFile,
    Repository,
}

impl LayerLevel {
    pub const ALL: [LayerLevel; 4] = [
        LayerLevel::System,
        LayerLevel::Global,
        LayerLevel::TriggerFile,
        LayerLevel::Repository,
    ];

    /// The `git config` scope flag for levels backed by git config files.
    pub fn git_scope(&self) -> Option<&'static str> {
        match self {
            LayerLevel::System => Some("--system"),
            LayerLevel::Global => Some("--global"),
            LayerLevel::TriggerFile => None,
            LayerLevel::Repository => Some("--local"),
        }
    }
}

impl fmt::Display for LayerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerLevel::System => "system",
            LayerLevel::Global => "global",
            LayerLevel::TriggerFile => TRIGGER_FILE,
            LayerLevel::Repository => "repository",
        };
        f.write_str(name)
    }
}

/// The key/value pairs defined at one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub level: LayerLevel,
    pub values: BTreeMap<String, String>,
}

impl ConfigLayer {
    pub fn new<K, V, I>(level: LayerLevel, values: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            level,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn empty(level: LayerLevel) -> Self {
        Self {
            level,
            values: BTreeMap::new(),
        }
    }

    /// Parse `git config --list` output (`section.key=value` per line).
    ///
    /// A key listed more than once keeps its last value, as git does.
    pub fn from_git_list(level: LayerLevel, listing: &str) -> Self {
        let values = listing
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| match line.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.to_string()),
                // A bare key is a boolean set to true in git config.
                None => (line.trim().to_string(), "true".to_string()),
            })
            .collect();
        Self { level, values }
    }

    /// Parse the .trigger file.
    ///
    /// Both flat dotted keys (`deploy.repo-name: app`) and nested sections
    /// (`deploy: {repo-name: app}`) are accepted.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(content)?;
        let mut values = BTreeMap::new();
        flatten("", &value, &mut values);
        Ok(Self {
            level: LayerLevel::TriggerFile,
            values,
        })
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&full, child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        Value::Null | Value::Sequence(_) => {
            tracing::debug!("Ignoring non-scalar value for {} in {}", prefix, TRIGGER_FILE);
        }
    }
}
