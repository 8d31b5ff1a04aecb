use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use url::Url;

/// Default backend origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8081";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration selecting the backend origin and request policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub api_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Loads the configuration from a file, environment variables, or
    /// defaults, in that order of precedence.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a YAML or JSON configuration file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed, when an
    /// environment override is malformed, or when the resolved
    /// configuration fails validation.
    pub fn load_config(
        config_path: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut config = Self::with_defaults();

        if let Some(path) = config_path {
            let content = fs::read_to_string(&path)?;
            let file_config: Self = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)?,
                Some("json") => serde_json::from_str(&content)?,
                _ => {
                    return Err("Unsupported configuration format. Use 'yaml' or 'json'.".into());
                }
            };
            config = file_config;
        }

        // Environment variables fill in anything the file left at defaults.
        if config.api_url == DEFAULT_API_URL {
            if let Ok(api_url) = env::var("REPOMARKET_API_URL") {
                config.api_url = api_url;
            }
        }
        if config.timeout_secs == DEFAULT_TIMEOUT_SECS {
            if let Ok(timeout) = env::var("REPOMARKET_TIMEOUT_SECS") {
                config.timeout_secs = timeout.parse().map_err(|_| {
                    "Invalid REPOMARKET_TIMEOUT_SECS value: must be a positive number of seconds"
                })?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the resolved configuration.
    ///
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.api_url)
            .map_err(|err| format!("Invalid api_url '{}': {err}", self.api_url))?;
        if self.timeout_secs == 0 {
            return Err("Invalid timeout_secs. Must be greater than 0.".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        // Safety: tests mutating process environment run serially.
        unsafe {
            env::remove_var("REPOMARKET_API_URL");
            env::remove_var("REPOMARKET_TIMEOUT_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ClientConfig::load_config(None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("REPOMARKET_API_URL", "https://api.repomarket.test");
            env::set_var("REPOMARKET_TIMEOUT_SECS", "5");
        }
        let config = ClientConfig::load_config(None).unwrap();
        assert_eq!(config.api_url, "https://api.repomarket.test");
        assert_eq!(config.timeout_secs, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_file_takes_precedence_over_env() {
        clear_env();
        unsafe {
            env::set_var("REPOMARKET_API_URL", "https://env.repomarket.test");
        }
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"api_url": "https://file.repomarket.test", "timeout_secs": 10}}"#
        )
        .unwrap();

        let config = ClientConfig::load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api_url, "https://file.repomarket.test");
        assert_eq!(config.timeout_secs, 10);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_yaml_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "api_url: https://yaml.repomarket.test\ntimeout_secs: 15\n"
        )
        .unwrap();

        let config = ClientConfig::load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api_url, "https://yaml.repomarket.test");
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    #[serial]
    fn test_unsupported_format_rejected() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "api_url = \"https://x\"").unwrap();

        assert!(ClientConfig::load_config(Some(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ClientConfig {
            api_url: "not a url".to_string(),
            timeout_secs: 30,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 0,
        };
        assert!(config.validate().is_err());
    }
}
