//! Environment-driven configuration.
//!
//! | Variable                | Default                          |
//! |-------------------------|----------------------------------|
//! | `PWD_RANGE_SERVICE_URL` | `https://api.pwnedpasswords.com` |
//! | `PWD_RANGE_PADDING`     | `false`                          |
//! | `PWD_LOOKUP_TIMEOUT_MS` | `1000`                           |
//! | `PWD_RULES_PATH`        | `./assets/rules.json`            |

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const RANGE_SERVICE_URL_VAR: &str = "PWD_RANGE_SERVICE_URL";
pub const RANGE_PADDING_VAR: &str = "PWD_RANGE_PADDING";
pub const LOOKUP_TIMEOUT_VAR: &str = "PWD_LOOKUP_TIMEOUT_MS";
pub const RULES_PATH_VAR: &str = "PWD_RULES_PATH";

const DEFAULT_RANGE_SERVICE_URL: &str = "https://api.pwnedpasswords.com";
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 1000;
const DEFAULT_RULES_PATH: &str = "./assets/rules.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    range_service_url: String,
    range_padding: bool,
    lookup_timeout: Duration,
    rules_path: PathBuf,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            range_service_url: DEFAULT_RANGE_SERVICE_URL.to_string(),
            range_padding: false,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
        }
    }
}

impl PolicyConfig {
    /// Reads the configuration from the environment, falling back to the
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(RANGE_SERVICE_URL_VAR) {
            config.range_service_url = url;
        }

        if let Ok(raw) = std::env::var(RANGE_PADDING_VAR) {
            config.range_padding = match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: RANGE_PADDING_VAR,
                        value: raw,
                    });
                }
            };
        }

        if let Ok(raw) = std::env::var(LOOKUP_TIMEOUT_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: LOOKUP_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.lookup_timeout = Duration::from_millis(millis);
        }

        if let Ok(path) = std::env::var(RULES_PATH_VAR) {
            config.rules_path = PathBuf::from(path);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            range_service_url = %config.range_service_url,
            range_padding = config.range_padding,
            lookup_timeout_ms = config.lookup_timeout.as_millis() as u64,
            "Password policy configuration loaded"
        );

        Ok(config)
    }

    pub fn with_range_service_url(mut self, url: impl Into<String>) -> Self {
        self.range_service_url = url.into();
        self
    }

    pub fn with_range_padding(mut self, padding: bool) -> Self {
        self.range_padding = padding;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = path.into();
        self
    }

    pub fn range_service_url(&self) -> &str {
        &self.range_service_url
    }

    pub fn range_padding(&self) -> bool {
        self.range_padding
    }

    /// Connect and read timeout applied to every outbound call.
    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    pub fn rules_path(&self) -> &Path {
        &self.rules_path
    }
}
