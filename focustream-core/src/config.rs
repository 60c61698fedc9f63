use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub resolver: ResolverConfig,
    pub populator: PopulatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file, loaded once at startup
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "data/streams.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How long the upstream URL itself is expected to stay valid (5 h)
    pub source_lifespan_secs: u64,
    /// Cache storage TTL for resolved records (4.5 h, below the source lifespan)
    pub cache_ttl_secs: u64,
    /// Probe resolved URLs before caching them
    pub validate_urls: bool,
    /// Per-call ceiling on metadata extraction
    pub extraction_timeout_secs: u64,
    /// Per-call ceiling on the liveness probe
    pub probe_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            source_lifespan_secs: 5 * 60 * 60,
            cache_ttl_secs: 16_200,
            validate_urls: true,
            extraction_timeout_secs: 30,
            probe_timeout_secs: 10,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn source_lifespan(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.source_lifespan_secs as i64)
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulatorConfig {
    /// Worker pool width for bulk resolution
    pub workers: usize,
    /// Chunk size for fire-and-forget dispatch
    pub chunk_size: usize,
    /// Pause between fire-and-forget chunks (upstream rate-limit courtesy)
    pub chunk_pause_ms: u64,
}

impl Default for PopulatorConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            chunk_size: 10,
            chunk_pause_ms: 1_000,
        }
    }
}

impl PopulatorConfig {
    #[must_use]
    pub const fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (FOCUSTREAM_RESOLVER_CACHE_TTL_SECS, etc.)
        builder = builder.add_source(
            Environment::with_prefix("FOCUSTREAM")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_documented_policy() {
        let config = Config::default();
        assert_eq!(config.resolver.source_lifespan_secs, 18_000);
        assert_eq!(config.resolver.cache_ttl_secs, 16_200);
        assert!(config.resolver.validate_urls);
        assert_eq!(config.populator.workers, 10);
        assert_eq!(config.populator.chunk_size, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn cache_ttl_stays_below_the_source_lifespan() {
        let config = ResolverConfig::default();
        assert!(config.cache_ttl() < Duration::from_secs(config.source_lifespan_secs));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[resolver]\nvalidate_urls = false\ncache_ttl_secs = 60\n\n[populator]\nworkers = 3"
        )
        .expect("write");

        let path = file.path().to_str().expect("utf-8 path");
        let config = Config::from_file(path).expect("config loads");
        assert!(!config.resolver.validate_urls);
        assert_eq!(config.resolver.cache_ttl_secs, 60);
        assert_eq!(config.populator.workers, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.resolver.extraction_timeout_secs, 30);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/focustream.toml")).expect("defaults");
        assert_eq!(config.populator.workers, 10);
    }
}
