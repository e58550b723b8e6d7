//! Deployment settings for the web tier
//!
//! Everything the topology needs that is not a stack parameter: where the
//! stack lives, which machine image each region boots, and where the
//! landing page is fetched from at boot.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stratus_provider_aws::schemas::types::validate_region;
use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_IMAGE_ID: &str = "ami-01cc34ab2709337aa";
pub const DEFAULT_ASSET_BUCKET: &str = "mycorp-webapp-resources";
pub const DEFAULT_ASSET_KEY: &str = "index.html";
pub const DEFAULT_WEB_ROOT: &str = "/var/www/html";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Object copied onto every web server at boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLocation {
    pub bucket: String,
    pub key: String,
}

impl Default for AssetLocation {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_ASSET_BUCKET.to_string(),
            key: DEFAULT_ASSET_KEY.to_string(),
        }
    }
}

impl AssetLocation {
    /// `s3://bucket/key`
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Topology configuration, read from a JSON file
///
/// ```json
/// {
///   "region": "us-east-1",
///   "images": { "us-east-1": "ami-01cc34ab2709337aa" },
///   "asset": { "bucket": "mycorp-webapp-resources", "key": "index.html" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub region: String,
    /// Region -> machine image id
    pub images: BTreeMap<String, String>,
    pub asset: AssetLocation,
    pub web_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            images: BTreeMap::from([(DEFAULT_REGION.to_string(), DEFAULT_IMAGE_ID.to_string())]),
            asset: AssetLocation::default(),
            web_root: DEFAULT_WEB_ROOT.to_string(),
            description: None,
        }
    }
}

impl TopologyConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: TopologyConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        log::debug!("loaded topology config from {}", path.display());
        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Image id for the configured region
    pub fn image_id(&self) -> Option<&str> {
        self.images.get(&self.region).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_region(&self.region).map_err(ConfigError::Invalid)?;
        if self.image_id().is_none() {
            return Err(ConfigError::Invalid(format!(
                "no image configured for region '{}'",
                self.region
            )));
        }
        if let Some((region, _)) = self.images.iter().find(|(_, image)| image.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "empty image id for region '{}'",
                region
            )));
        }
        if self.asset.bucket.is_empty() || self.asset.key.is_empty() {
            return Err(ConfigError::Invalid(
                "asset bucket and key must not be empty".to_string(),
            ));
        }
        if !self.web_root.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "web_root '{}' must be an absolute path",
                self.web_root
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_preserve_single_region_deployment() {
        let config = TopologyConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.image_id(), Some("ami-01cc34ab2709337aa"));
        assert_eq!(config.asset.uri(), "s3://mycorp-webapp-resources/index.html");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "asset": {{ "bucket": "other-bucket" }} }}"#).unwrap();

        let config = TopologyConfig::load(file.path()).unwrap();
        assert_eq!(config.asset.bucket, "other-bucket");
        assert_eq!(config.asset.key, "index.html");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.web_root, "/var/www/html");
    }

    #[test]
    fn load_rejects_region_without_image() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "region": "eu-west-1" }}"#).unwrap();

        let err = TopologyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("eu-west-1"));
    }

    #[test]
    fn load_reports_parse_and_io_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            TopologyConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TopologyConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_asset() {
        let mut config = TopologyConfig::default();
        config.asset.key.clear();
        assert!(config.validate().is_err());

        let config = TopologyConfig {
            web_root: "var/www".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_region() {
        let config = TopologyConfig::default().with_region("mars-1");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid region 'mars-1'"));
    }

    #[test]
    fn region_override_switches_image() {
        let mut config = TopologyConfig::default();
        config
            .images
            .insert("eu-west-1".to_string(), "ami-0abc".to_string());
        let config = config.with_region("eu-west-1");
        assert_eq!(config.image_id(), Some("ami-0abc"));
    }
}
