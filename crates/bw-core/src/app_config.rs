use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use bw_auth::config::{API_URL_VAR, DEFAULT_API_URL};

/// Local application settings, stored as `config.toml` under the platform
/// config directory
///
/// Environment variables override the file; the file overrides the built-in
/// defaults. A missing file is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API base URL
    pub api_base_url: String,
    /// Route the shell opens on after startup
    pub landing_route: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            landing_route: crate::routes::HOME_ROUTE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default location, then apply environment overrides
    pub async fn load() -> anyhow::Result<Self> {
        let config = match Self::config_file()? {
            path if path.exists() => Self::load_from(&path).await?,
            _ => Self::default(),
        };
        Ok(config.apply_env())
    }

    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_slice(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        tokio::fs::write(path, toml)
            .await
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Fold environment overrides into the loaded settings
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_VAR) {
            self.api_base_url = url;
        }
        self
    }

    fn config_file() -> anyhow::Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "bookswap").context("Failed to get project directories")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig {
            api_base_url: "https://api.shop.example/v1/".to_string(),
            landing_route: "/books".to_string(),
        };

        config.save_to(&path).await.unwrap();
        let loaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "invalid toml content [[[")
            .await
            .unwrap();

        assert!(AppConfig::load_from(&path).await.is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error_when_loaded_directly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        assert!(AppConfig::load_from(&path).await.is_err());
    }

    #[test]
    fn defaults_point_at_the_local_backend() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.landing_route, "/");
    }
}
