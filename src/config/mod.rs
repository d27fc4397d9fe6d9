use crate::core::{AppError, Result};
use std::env;
use std::str::FromStr;

pub mod server;
pub mod upstream;

pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Optional TTL cache and batch loader in front of the upstream API
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: 300,
            max_capacity: 10_000,
        }
    }
}

/// What a report does when its primary collection cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegradePolicy {
    /// Surface the upstream error to the caller
    #[default]
    Propagate,
    /// Answer with a zero-valued report shape
    ZeroValue,
}

impl FromStr for DegradePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(DegradePolicy::Propagate),
            "zero" | "zero_value" => Ok(DegradePolicy::ZeroValue),
            other => Err(AppError::Configuration(format!(
                "Invalid REPORT_DEGRADE_POLICY '{}' (expected 'propagate' or 'zero')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub degrade_policy: DegradePolicy,
    /// Ranking limit when none is requested; also sizes the top-selling list
    pub default_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            degrade_policy: DegradePolicy::Propagate,
            default_limit: 10,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: &str) -> Result<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            server: ServerConfig::from_env()?,
            upstream: UpstreamConfig::from_env()?,
            cache: CacheConfig {
                enabled: parse_env("CACHE_ENABLED", "false")?,
                ttl_secs: parse_env("CACHE_TTL_SECS", "300")?,
                max_capacity: parse_env("CACHE_MAX_CAPACITY", "10000")?,
            },
            reports: ReportConfig {
                degrade_policy: env::var("REPORT_DEGRADE_POLICY")
                    .unwrap_or_else(|_| "propagate".to_string())
                    .parse()?,
                default_limit: parse_env("REPORT_DEFAULT_LIMIT", "10")?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Configuration(
                "PORT must be greater than 0".to_string(),
            ));
        }

        self.upstream.validate()?;

        if self.reports.default_limit == 0 {
            return Err(AppError::Configuration(
                "Report default limit must be greater than 0".to_string(),
            ));
        }

        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(AppError::Configuration(
                "Cache TTL must be greater than 0 when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
