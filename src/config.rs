use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable naming an extra configuration file
pub const CONFIG_FILE_ENV: &str = "CATALOG_SEARCH_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search backends
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, the file named by
    /// `CATALOG_SEARCH_CONFIG`, and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    /// Like [`Config::load`], reading `path` instead of the file named in the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            // Override with environment variables (prefix: CATALOG_SEARCH__)
            .add_source(
                config::Environment::with_prefix("CATALOG_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.search.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::IndexEngineKind;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::load_from(None).unwrap();
        assert_eq!(config.search.index_engine, IndexEngineKind::Embedded);
        assert_eq!(config.search.page_ceiling, 500);
        assert_eq!(config.search.scroll_batch_size, 500);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.search.sparql.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[search]\npage_ceiling = 100\n\n[search.sparql]\nendpoint = \"http://localhost:3030/ds/sparql\""
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.search.page_ceiling, 100);
        assert_eq!(config.search.deep_pagination_ceiling, 10_000);
        let sparql = config.search.sparql.unwrap();
        assert_eq!(sparql.resource_base, "http://imeji.org/");
    }

    #[test]
    fn test_validate_rejects_inverted_ceilings() {
        let mut config = Config::default();
        config.search.page_ceiling = 1_000;
        config.search.deep_pagination_ceiling = 100;
        assert!(config.validate().is_err());
    }
}
