//! Client configuration.

use std::time::Duration;

/// Configuration for the print provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider API base URL, without a trailing slash.
    pub base_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// How early a cached token counts as expired.
    pub token_refresh_skew: Duration,
}

impl ProviderConfig {
    /// Creates a config with the default refresh skew.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_refresh_skew: Duration::from_secs(30),
        }
    }
}

/// Configuration for the object storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage base URL, without a trailing slash.
    pub base_url: String,
}

impl StorageConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
        }
    }
}

/// Configuration for the licensing client.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    /// Membership service base URL, without a trailing slash.
    pub base_url: String,
    /// Service API key.
    pub api_key: String,
    /// The license key to check features against.
    pub license_key: String,
}

impl LicenseConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        license_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            api_key: api_key.into(),
            license_key: license_key.into(),
        }
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
