// ABOUTME: Registry of configuration keys trigger understands.
// ABOUTME: Each key declares whether it is required and its default value.

pub const REPO_NAME: &str = "deploy.repo-name";
pub const REQUIRED_UMASK: &str = "deploy.required-umask";
pub const USER_NAME: &str = "user.name";
pub const USER_EMAIL: &str = "user.email";
pub const CHECKOUT_SUBMODULES: &str = "deploy.checkout-submodules";
pub const LOCK_DRIVER: &str = "deploy.lock-driver";
pub const SYNC_DRIVER: &str = "deploy.sync-driver";
pub const SERVICE_DRIVER: &str = "deploy.service-driver";
pub const REPORT_DRIVER: &str = "deploy.report-driver";
pub const STATUS_STORE_URL: &str = "deploy.status-store-url";
pub const DISPATCH_COMMAND: &str = "deploy.dispatch-command";

/// Name of the driver family shipped with trigger.
pub const DEFAULT_DRIVER: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigKey {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
}

impl ConfigKey {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            default: None,
        }
    }

    const fn optional(name: &'static str, default: Option<&'static str>) -> Self {
        Self {
            name,
            required: false,
            default,
        }
    }
}

pub const KEYS: &[ConfigKey] = &[
    ConfigKey::required(REPO_NAME),
    ConfigKey::optional(REQUIRED_UMASK, None),
    ConfigKey::required(USER_NAME),
    ConfigKey::required(USER_EMAIL),
    ConfigKey::optional(CHECKOUT_SUBMODULES, Some("false")),
    ConfigKey::optional(LOCK_DRIVER, Some(DEFAULT_DRIVER)),
    ConfigKey::optional(SYNC_DRIVER, Some(DEFAULT_DRIVER)),
    ConfigKey::optional(SERVICE_DRIVER, Some(DEFAULT_DRIVER)),
    ConfigKey::optional(REPORT_DRIVER, Some(DEFAULT_DRIVER)),
    ConfigKey::optional(STATUS_STORE_URL, Some("redis://127.0.0.1:6379")),
    ConfigKey::optional(
        DISPATCH_COMMAND,
        Some("sudo salt-call -l quiet --out=json publish.runner"),
    ),
];
