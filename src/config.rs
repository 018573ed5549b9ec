//! Service configuration.
//!
//! Loaded from a TOML file; every section is optional and falls back to the
//! defaults of the original deployment (port 5000, `./artifacts/...`).

use crate::estimator::EstimatorConfig;
use crate::schema::SchemaConfig;
use crate::store::ArtifactPaths;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts: ArtifactPaths,
    pub schema: SchemaConfig,
    pub estimator: EstimatorConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }
}

/// Template written by `--generate-config`.
pub fn default_config_template() -> String {
    r#"# Home price inference service configuration

[server]
host = "0.0.0.0"
port = 5000

[artifacts]
# {"data_columns": ["total_sqft", "bath", "bed", "<location>", ...]}
columns = "./artifacts/columns.json"
# .json linear model ({"coefficients": [...], "intercept": ...}) or .onnx
model = "./artifacts/banglore_home_prices_model.json"

[schema]
area_column = "total_sqft"
bath_column = "bath"
bed_column = "bed"

[estimator]
# "reject" fails unknown locations, "ignore" predicts without a location
unknown_location = "reject"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::UnknownLocationPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.artifacts.columns, PathBuf::from("./artifacts/columns.json"));
        assert_eq!(config.schema.bed_column, "bed");
        assert_eq!(config.estimator.unknown_location, UnknownLocationPolicy::Reject);
    }

    #[test]
    fn test_template_round_trips_to_defaults() {
        let config = Config::from_toml(&default_config_template()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [artifacts]
            model = "/srv/model.onnx"

            [estimator]
            unknown_location = "ignore"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.artifacts.model, PathBuf::from("/srv/model.onnx"));
        assert_eq!(config.artifacts.columns, PathBuf::from("./artifacts/columns.json"));
        assert_eq!(config.estimator.unknown_location, UnknownLocationPolicy::Ignore);
    }

    #[test]
    fn test_invalid_policy() {
        let err = Config::from_toml("[estimator]\nunknown_location = \"guess\"").unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("unknown_location") || msg.contains("guess"));
    }

    #[test]
    fn test_server_addr() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
        };
        assert_eq!(
            server.addr().unwrap(),
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );

        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 5000,
        };
        assert!(bad.addr().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        assert!(Config::from_file("/nonexistent/config.toml").is_err());
    }
}
