//! HTTP license gate client.

use async_trait::async_trait;
use pipeline::{FEATURE_ALL, LicenseGate, PipelineError};
use serde::Deserialize;

use crate::config::LicenseConfig;

/// License gate backed by a membership service.
///
/// A feature is granted when the license is active, unexpired, and
/// its feature list carries either the feature or `all`.
pub struct HttpLicenseGate {
    client: reqwest::Client,
    config: LicenseConfig,
}

#[derive(Debug, Deserialize)]
struct LicenseDto {
    status: String,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    metadata: LicenseMetadataDto,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseMetadataDto {
    #[serde(default)]
    features: Vec<String>,
}

impl LicenseDto {
    fn grants(&self, feature: &str) -> bool {
        if self.status != "active" {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at < chrono::Utc::now() {
                return false;
            }
        }
        self.metadata
            .features
            .iter()
            .any(|f| f == feature || f == FEATURE_ALL)
    }
}

impl HttpLicenseGate {
    /// Creates a licensing client.
    pub fn new(config: LicenseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LicenseGate for HttpLicenseGate {
    #[tracing::instrument(skip(self))]
    async fn has_feature(&self, feature: &str) -> Result<bool, PipelineError> {
        let url = format!(
            "{}/licenses/{}",
            self.config.base_url, self.config.license_key
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("License check failed: {}", e)))?;

        // An unknown license key grants nothing.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "License service returned {}",
                response.status()
            )));
        }

        let license: LicenseDto = response
            .json()
            .await
            .map_err(|e| PipelineError::Provider(format!("Bad license response: {}", e)))?;

        Ok(license.grants(feature))
    }
}
