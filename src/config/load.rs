// ABOUTME: Loads every configuration layer for a work tree.
// ABOUTME: Git config scopes come from `git config --list`, the .trigger file from YAML.

use super::{Config, ConfigLayer, ConfigurationError, LayerLevel, TRIGGER_FILE};
use crate::git::GitCli;

/// Read all layers and resolve them into a [`Config`].
pub async fn load(git: &GitCli) -> Result<Config, ConfigurationError> {
    let mut layers = Vec::with_capacity(LayerLevel::ALL.len());

    for level in LayerLevel::ALL {
        let layer = match level {
            LayerLevel::TriggerFile => load_trigger_file(git).await,
            _ => {
                let listing = git
                    .config_list(level)
                    .await
                    .map_err(|e| ConfigurationError::NotARepository(e.to_string()))?;
                ConfigLayer::from_git_list(level, &listing)
            }
        };
        layers.push(layer);
    }

    Ok(Config::resolve(&layers))
}

async fn load_trigger_file(git: &GitCli) -> ConfigLayer {
    let path = git.work_tree().join(TRIGGER_FILE);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(_) => return ConfigLayer::empty(LayerLevel::TriggerFile),
    };

    match ConfigLayer::from_yaml(&content) {
        Ok(layer) => layer,
        Err(e) => {
            tracing::warn!(
                "Found a {} config file, but could not parse it ({}). Unable to load repo specific config.",
                TRIGGER_FILE,
                e
            );
            ConfigLayer::empty(LayerLevel::TriggerFile)
        }
    }
}
