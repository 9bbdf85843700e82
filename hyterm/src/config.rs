use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HyError, HyResult};

/// Environment variable overriding the location of the engine configuration file.
pub const ENV_CONFIG_PATH: &str = "HYTERM_CONFIG_PATH";

/// Settings of the [`Rewriter`](crate::rules::engine::Rewriter).
///
/// ```toml
/// max_steps = 10000
/// trace_steps = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the number of rewrites of a single execution. Unbounded if `None`.
    pub max_steps: Option<usize>,

    /// Log every intermediate value (at `debug` level) while executing.
    pub trace_steps: bool,
}

impl EngineConfig {
    /// Get the default path to the engine configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        // Fallback to default paths based on OS
        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("hyperion");
        path.push("hyterm.toml");
        path
    }

    /// Parse a configuration from TOML text; `origin` names the source in errors.
    pub fn from_toml_str(toml_str: &str, origin: &str) -> HyResult<Self> {
        toml::from_str(toml_str).map_err(|e| HyError::ConfigParseError {
            source: e,
            file: origin.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> HyResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str, &path.display().to_string())
    }

    /// Load the configuration at [`EngineConfig::default_path`], or the defaults if there is
    /// no such file.
    pub fn load_default() -> HyResult<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::load_from_toml(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> HyResult<()> {
        let toml_str = toml::to_string(self)?;

        // Attempt to create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
