//! Deploy configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.stackship/
//!   config.yaml   (mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home, used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const DEFAULT_FORCE_UPDATE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ROLLOUT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_ARTIFACT_NAMESPACE: &str = "manual";

/// Tunables for a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Upper bound on waiting for a forced refresh to stabilise.
    pub force_update_timeout_secs: u64,
    /// How often rollout state is polled while waiting.
    pub rollout_poll_interval_secs: u64,
    /// First segment of every content-addressed key.
    pub artifact_namespace: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            force_update_timeout_secs: DEFAULT_FORCE_UPDATE_TIMEOUT_SECS,
            rollout_poll_interval_secs: DEFAULT_ROLLOUT_POLL_INTERVAL_SECS,
            artifact_namespace: DEFAULT_ARTIFACT_NAMESPACE.to_string(),
        }
    }
}

impl DeployConfig {
    pub fn force_update_timeout(&self) -> Duration {
        Duration::from_secs(self.force_update_timeout_secs)
    }

    pub fn rollout_poll_interval(&self) -> Duration {
        Duration::from_secs(self.rollout_poll_interval_secs)
    }

    /// Reject values that would make the force-update wait meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.force_update_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "force_update_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.rollout_poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "rollout_poll_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.artifact_namespace.is_empty() || self.artifact_namespace.contains('/') {
            return Err(ConfigError::Invalid {
                field: "artifact_namespace",
                reason: format!(
                    "'{}' must be a single non-empty path segment",
                    self.artifact_namespace
                ),
            });
        }
        Ok(())
    }
}

/// `<home>/.stackship/config.yaml`, pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".stackship").join("config.yaml")
}

/// Load the deploy config. A missing file yields the defaults.
pub fn load_at(home: &Path) -> Result<DeployConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(DeployConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let config: DeployConfig = serde_yaml::from_str(&contents)
        .map_err(|source| ConfigError::Parse { path, source })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<DeployConfig, ConfigError> {
    load_at(&home()?)
}

/// Atomically save the deploy config.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &DeployConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let path = config_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid config path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &DeployConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
