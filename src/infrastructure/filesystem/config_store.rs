use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use validator::Validate;

use crate::domain::entities::DeploymentConfig;

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Configuration file read failed: {0}")]
    ReadFailed(String),

    #[error("YAML parsing failed: {0}")]
    YamlParsingFailed(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Loads and validates `deploy.yml`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Read deployment configuration from a YAML file
    pub fn load<P: AsRef<Path>>(&self, config_path: P) -> Result<DeploymentConfig, ConfigStoreError> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConfigStoreError::ConfigFileNotFound(
                config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(config_path)
            .map_err(|e| ConfigStoreError::ReadFailed(e.to_string()))?;

        let config = self.parse(&contents)?;
        debug!(
            path = %config_path.display(),
            hosts = config.hosts.len(),
            "loaded deployment configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(&self, contents: &str) -> Result<DeploymentConfig, ConfigStoreError> {
        let config: DeploymentConfig = serde_yaml::from_str(contents)
            .map_err(|e| ConfigStoreError::YamlParsingFailed(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigStoreError::ValidationFailed(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
scm:
  repository: https://svn.example.com/repo/trunk
  repository_unreachable_from_remote: true
deploy_to: /srv/app
hosts:
  - name: app01
max_concurrency: 4
"#;

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config = ConfigStore::new().load(file.path()).unwrap();
        assert!(config.scm.is_relay_only());
        assert_eq!(config.max_concurrency, 4);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigStore::new().load("/definitely/not/here/deploy.yml");
        assert!(matches!(result, Err(ConfigStoreError::ConfigFileNotFound(_))));
    }

    #[test]
    fn test_unknown_option_is_a_parse_error() {
        let yaml = VALID.replace("max_concurrency", "max_concurency");
        let result = ConfigStore::new().parse(&yaml);
        assert!(matches!(result, Err(ConfigStoreError::YamlParsingFailed(_))));
    }

    #[test]
    fn test_invalid_repository_url() {
        let yaml = VALID.replace("https://svn.example.com/repo/trunk", "relative/path");
        let result = ConfigStore::new().parse(&yaml);
        assert!(matches!(result, Err(ConfigStoreError::YamlParsingFailed(_))));
    }

    #[test]
    fn test_validation_failure() {
        let yaml = VALID.replace("max_concurrency: 4", "max_concurrency: 0");
        let result = ConfigStore::new().parse(&yaml);
        assert!(matches!(result, Err(ConfigStoreError::ValidationFailed(_))));
    }
}
