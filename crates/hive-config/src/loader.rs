//! Configuration loader.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when absent.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        if !config.logging.directory.is_empty() {
            config.logging.directory = Self::expand_path(&config.logging.directory);
        }
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    ///
    /// Comment lines are copied untouched.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(content.len());

        for line in content.lines() {
            if line.trim_start().starts_with('#') {
                result.push_str(line);
            } else {
                let mut expanded = line.to_string();
                for cap in ENV_VAR.captures_iter(line) {
                    let var_name = &cap[1];
                    let var_value = std::env::var(var_name)
                        .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
                    expanded = expanded.replace(&cap[0], &var_value);
                }
                result.push_str(&expanded);
            }
            result.push('\n');
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.hive/logs`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
