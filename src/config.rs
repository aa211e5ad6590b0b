use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, EvbError};

/// Base URL of the public EditVideoBot API.
pub const DEFAULT_ENDPOINT: &str = "https://pigeonburger.xyz/api/v1/";

fn default_user_agent() -> String {
    format!("evb/{}", env!("CARGO_PKG_VERSION"))
}

fn default_extension() -> String {
    crate::session::DEFAULT_EXTENSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub edit: EditConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; `edit/` and `stats/` are resolved against it
    pub endpoint: String,
    /// API key; the `EVB_API_KEY` environment variable takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditConfig {
    /// Extension used for the uploaded file name when none can be inferred
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            default_extension: default_extension(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_key: None,
                user_agent: default_user_agent(),
            },
            edit: EditConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EvbError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| EvbError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EvbError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| EvbError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api.endpoint)
            .map_err(|e| EvbError::Config(format!("Invalid endpoint {:?}: {}", self.api.endpoint, e)))?;

        if self.edit.default_extension.is_empty() || self.edit.default_extension.contains('.') {
            return Err(EvbError::Config(format!(
                "default_extension must be a bare extension like \"mp4\", got {:?}",
                self.edit.default_extension
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evb.toml");

        let mut config = Config::default();
        config.api.api_key = Some("abc123".to_string());
        config.edit.default_extension = "gif".to_string();
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evb.toml");
        std::fs::write(&path, "[api]\nendpoint = \"http://localhost:8080/api/v1/\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api.endpoint, "http://localhost:8080/api/v1/");
        assert_eq!(config.api.api_key, None);
        assert_eq!(config.api.user_agent, default_user_agent());
        assert_eq!(config.edit.default_extension, "mp4");
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evb.toml");
        std::fs::write(&path, "[api]\nendpoint = \"not a url\"\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(EvbError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/definitely/not/here/evb.toml"),
            Err(EvbError::Config(_))
        ));
    }
}
