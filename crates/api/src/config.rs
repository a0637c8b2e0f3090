//! Application configuration loaded from environment variables.

use client::{LicenseConfig, ProviderConfig, StorageConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `PROVIDER_BASE_URL`, `PROVIDER_CLIENT_ID`, `PROVIDER_CLIENT_SECRET`
/// - `STORAGE_BASE_URL`
/// - `LICENSE_BASE_URL`, `LICENSE_API_KEY`, `LICENSE_KEY`
///
/// The upstream settings are optional. When any of them is missing the
/// server starts in dev mode, backed entirely by in-memory services.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub provider_base_url: Option<String>,
    pub provider_client_id: Option<String>,
    pub provider_client_secret: Option<String>,
    pub storage_base_url: Option<String>,
    pub license_base_url: Option<String>,
    pub license_api_key: Option<String>,
    pub license_key: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider_base_url: std::env::var("PROVIDER_BASE_URL").ok(),
            provider_client_id: std::env::var("PROVIDER_CLIENT_ID").ok(),
            provider_client_secret: std::env::var("PROVIDER_CLIENT_SECRET").ok(),
            storage_base_url: std::env::var("STORAGE_BASE_URL").ok(),
            license_base_url: std::env::var("LICENSE_BASE_URL").ok(),
            license_api_key: std::env::var("LICENSE_API_KEY").ok(),
            license_key: std::env::var("LICENSE_KEY").ok(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the upstream service configs when every required variable is
    /// present. Returns `None` otherwise, which selects dev mode.
    pub fn upstream(&self) -> Option<(ProviderConfig, StorageConfig, LicenseConfig)> {
        let provider = ProviderConfig::new(
            self.provider_base_url.clone()?,
            self.provider_client_id.clone()?,
            self.provider_client_secret.clone()?,
        );
        let storage = StorageConfig::new(self.storage_base_url.clone()?);
        let license = LicenseConfig::new(
            self.license_base_url.clone()?,
            self.license_api_key.clone()?,
            self.license_key.clone()?,
        );
        Some((provider, storage, license))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            provider_base_url: None,
            provider_client_id: None,
            provider_client_secret: None,
            storage_base_url: None,
            license_base_url: None,
            license_api_key: None,
            license_key: None,
        }
    }
}
