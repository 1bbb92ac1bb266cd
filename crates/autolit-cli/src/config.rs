//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for autolit
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub contact: ContactConfig,
    pub output: OutputConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ContactConfig {
    /// Contact email sent to NCBI and the OpenAlex polite pool.
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// "json", "csv" or "both"
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub max_results: usize,
    pub years_back: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_results: 1000,
            years_back: 5,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./autolit.toml (current directory)
    /// 2. ~/.config/autolit/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("autolit.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "autolit") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("./output"));
        assert_eq!(config.output.format, "json");
        assert_eq!(config.defaults.max_results, 1000);
        assert_eq!(config.defaults.years_back, 5);
        assert_eq!(config.contact.email, None);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("AUTOLIT_TEST_VAR", "a@b.org");
        assert_eq!(
            expand_env_var("${AUTOLIT_TEST_VAR}"),
            Some("a@b.org".to_string())
        );
        std::env::remove_var("AUTOLIT_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[contact]
email = "curator@example.org"

[output]
dir = "/tmp/papers"
format = "both"

[defaults]
max_results = 250
years_back = 3
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.contact.email.as_deref(), Some("curator@example.org"));
        assert_eq!(config.output.dir, PathBuf::from("/tmp/papers"));
        assert_eq!(config.output.format, "both");
        assert_eq!(config.defaults.max_results, 250);
        assert_eq!(config.defaults.years_back, 3);
    }
}
