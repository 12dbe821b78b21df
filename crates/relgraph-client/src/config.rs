use std::path::Path;

use relgraph_http::FetchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for one client session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root every resource URI is built from; must end with `/`.
    pub api_root: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let fetch = FetchConfig::default();
        Self {
            api_root: "http://localhost:3000/".into(),
            request_timeout_ms: fetch.request_timeout_ms,
            user_agent: fetch.user_agent,
            log: LogConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.api_root.is_empty() {
            return Err(ClientError::Config("api_root is empty".into()));
        }
        if !self.api_root.ends_with('/') {
            return Err(ClientError::Config(format!(
                "api_root must end with '/': {}",
                self.api_root
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::Config("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            request_timeout_ms: self.request_timeout_ms,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.api_root, "http://localhost:3000/");
        assert_eq!(c.request_timeout_ms, 30_000);
        assert!(c.user_agent.starts_with("relgraph/"));
        assert_eq!(c.log.level, "info");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_full_file() {
        let c = ClientConfig::from_toml_str(
            r#"
            api_root = "https://api.example.com/v1/"
            request_timeout_ms = 5000
            user_agent = "suppliers-app/2.0"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(c.api_root, "https://api.example.com/v1/");
        assert_eq!(c.request_timeout_ms, 5000);
        assert_eq!(c.log.level, "debug");
        assert_eq!(c.fetch_config().user_agent, "suppliers-app/2.0");
    }

    #[test]
    fn missing_keys_take_defaults() {
        let c = ClientConfig::from_toml_str(r#"api_root = "http://h/""#).unwrap();
        assert_eq!(c.request_timeout_ms, 30_000);
        assert_eq!(c.log, LogConfig::default());
    }

    #[test]
    fn rejects_root_without_trailing_slash() {
        let err = ClientConfig::from_toml_str(r#"api_root = "http://h""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ClientConfig::from_toml_str("api_root = ").unwrap_err();
        assert!(matches!(err, ClientError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_root = \"http://files/\"\n[log]\nlevel = \"warn\"").unwrap();
        let c = ClientConfig::load(file.path()).unwrap();
        assert_eq!(c.api_root, "http://files/");
        assert_eq!(c.log.level, "warn");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let c = ClientConfig {
            api_root: "http://x/".into(),
            ..Default::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(ClientConfig::from_toml_str(&text).unwrap(), c);
    }
}
