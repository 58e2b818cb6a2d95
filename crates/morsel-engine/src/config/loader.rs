use std::path::Path;

use thiserror::Error;

use super::SitesConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub async fn load_from(path: &Path) -> Result<SitesConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: SitesConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
