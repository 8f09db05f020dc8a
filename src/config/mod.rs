use crate::{
    error::{ApiError, Result},
    recommender::{RecommenderConfig, TopKMode},
};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON catalog file used when no REST catalog is configured
    pub catalog_path: String,
    pub catalog_url: Option<String>,
    pub catalog_api_key: Option<String>,
    pub top_k: usize,
    pub max_top_k: usize,
    pub top_k_mode: TopKMode,
    pub include_description: bool,
    pub max_catalog_size: usize,
    pub cache_ttl_seconds: u64,
}

impl Config {
    /// Load configuration from `APP_*` environment variables, falling back to defaults
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("catalog_path", "catalog.json")?
            .set_default("top_k", 4)?
            .set_default("max_top_k", 50)?
            .set_default("top_k_mode", "survivors")?
            .set_default("include_description", true)?
            .set_default("max_catalog_size", 10_000)?
            .set_default("cache_ttl_seconds", 300)?
            .add_source(config::Environment::with_prefix("APP").try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(ApiError::ConfigError("APP_TOP_K must be at least 1".into()));
        }
        if self.top_k > self.max_top_k {
            return Err(ApiError::ConfigError(format!(
                "APP_TOP_K ({}) exceeds APP_MAX_TOP_K ({})",
                self.top_k, self.max_top_k
            )));
        }
        if self.catalog_url.is_some() != self.catalog_api_key.is_some() {
            return Err(ApiError::ConfigError(
                "APP_CATALOG_URL and APP_CATALOG_API_KEY must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn recommender(&self) -> RecommenderConfig {
        RecommenderConfig {
            top_k: self.top_k,
            top_k_mode: self.top_k_mode,
            include_description: self.include_description,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            catalog_path: "catalog.json".to_string(),
            catalog_url: None,
            catalog_api_key: None,
            top_k: 4,
            max_top_k: 50,
            top_k_mode: TopKMode::Survivors,
            include_description: true,
            max_catalog_size: 10_000,
            cache_ttl_seconds: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recommender_settings() {
        let recommender = Config::default().recommender();
        assert_eq!(recommender.top_k, 4);
        assert_eq!(recommender.top_k_mode, TopKMode::Survivors);
        assert!(recommender.include_description);
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = Config {
            top_k: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn test_validate_requires_rest_credentials_together() {
        let config = Config {
            catalog_url: Some("http://localhost:3000".into()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
