//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Block hierarchy configuration.
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Block hierarchy traversal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyConfig {
    /// Maximum number of parent steps taken from any starting block.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Keep one loaded block tree per community in memory.
    #[serde(default = "default_true")]
    pub cache_block_trees: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            cache_block_trees: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_max_depth() -> usize {
    10
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `RESIDENCE_ENV`)
    /// 3. Environment variables with `RESIDENCE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("RESIDENCE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RESIDENCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_defaults() {
        let hierarchy = HierarchyConfig::default();
        assert_eq!(hierarchy.max_depth, 10);
        assert!(hierarchy.cache_block_trees);
    }

    #[test]
    fn test_deserialize_without_hierarchy_section() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "https://residence.example"

                [database]
                url = "postgres://localhost/residence"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.hierarchy.max_depth, 10);
    }

    #[test]
    fn test_deserialize_hierarchy_override() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "https://residence.example"

                [database]
                url = "postgres://localhost/residence"

                [hierarchy]
                max_depth = 4
                cache_block_trees = false
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.hierarchy.max_depth, 4);
        assert!(!config.hierarchy.cache_block_trees);
    }
}
