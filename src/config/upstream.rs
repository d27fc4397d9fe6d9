use crate::core::{AppError, Result};
use reqwest::{Client, Url};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api_rest/api/v1/";

/// Upstream REST API connection settings
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Always ends with `/` so relative endpoint paths join under it
    pub base_url: String,
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            base_url,
            timeout_secs,
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url =
            env::var("UPSTREAM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid UPSTREAM_TIMEOUT_SECS".to_string()))?;

        Ok(Self::new(base_url, timeout_secs))
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid UPSTREAM_BASE_URL '{}': {}", self.base_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::Configuration(format!(
                "UPSTREAM_BASE_URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the shared HTTP client with a bounded request duration.
    pub fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(AppError::HttpClient)
    }
}
