//! Configuration for the Causeway coordinator
//!
//! Loads configuration from TOML with environment variable substitution.
//! The host embeds the engine, so the config surface is deliberately small:
//! the invocation channel plus the two lock/compensation policy knobs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Invocation namespace handed to the resource invoker with every call
    pub channel: String,
    /// Suffix appended to a step's method name to form its compensating method
    pub revert_suffix: String,
    /// When set, a coordinated call must present the exact path recorded at
    /// lock time, not just the right transaction id
    pub strict_lock_binding: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            revert_suffix: "_revert".to_string(),
            strict_lock_binding: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&config_str)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let config: EngineConfig =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.revert_suffix.is_empty() {
            anyhow::bail!("revert_suffix must not be empty");
        }
        Ok(())
    }

    /// Compensating method name for an applied step
    pub fn revert_method(&self, method: &str) -> String {
        format!("{}{}", method, self.revert_suffix)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.revert_suffix, "_revert");
        assert!(!config.strict_lock_binding);
        assert_eq!(config.revert_method("transfer"), "transfer_revert");
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_CHANNEL", "mychannel");
        let input = "channel = \"${TEST_CHANNEL}\"";
        let config = EngineConfig::from_toml_str(input).unwrap();
        assert_eq!(config.channel, "mychannel");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "channel = \"payments\"\nrevert_suffix = \"_undo\"\nstrict_lock_binding = true"
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel, "payments");
        assert_eq!(config.revert_method("set"), "set_undo");
        assert!(config.strict_lock_binding);
    }

    #[test]
    fn test_empty_revert_suffix_rejected() {
        assert!(EngineConfig::from_toml_str("revert_suffix = \"\"").is_err());
    }
}
