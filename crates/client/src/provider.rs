//! HTTP print provider client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    BookSpecification, ExternalId, FileRole, JobStatus, StagedFile, ValidationResult,
    ValidationStatus,
};
use pipeline::{JobSubmission, PipelineError, PrintProvider, ProviderJob};
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::token::TokenCache;

const OAUTH_SCOPE: &str = "print-fulfillment-api";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Print provider client over HTTP with OAuth2 client-credentials
/// authentication.
///
/// The access token lives in an instance-owned [`TokenCache`]. A 401
/// triggers exactly one transparent re-authentication; a second 401
/// surfaces as `AuthenticationFailed`.
pub struct HttpPrintProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    tokens: TokenCache,
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileValidationDto {
    status: String,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PrintJobDto {
    id: String,
    status: String,
    tracking_url: Option<String>,
    estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PrintJobListDto {
    #[serde(default)]
    results: Vec<PrintJobDto>,
}

impl From<PrintJobDto> for ProviderJob {
    fn from(dto: PrintJobDto) -> Self {
        ProviderJob {
            status: job_status_from_wire(&dto.status),
            id: dto.id,
            tracking_url: dto.tracking_url,
            estimated_delivery: dto.estimated_delivery,
        }
    }
}

/// Maps a provider wire status onto [`JobStatus`].
///
/// Unknown wire statuses map to `Created`, the least-advanced value,
/// so they can never advance a job under the monotonic merge.
fn job_status_from_wire(status: &str) -> JobStatus {
    match status.to_ascii_uppercase().as_str() {
        "CREATED" | "UNPAID" | "PAYMENT_IN_PROGRESS" => JobStatus::Created,
        "ACCEPTED" | "IN_PRODUCTION" | "PRODUCTION_DELAYED" => JobStatus::InProduction,
        "SHIPPED" => JobStatus::Shipped,
        "DELIVERED" => JobStatus::Delivered,
        "ERROR" | "REJECTED" | "CANCELED" | "CANCELLED" => JobStatus::Error,
        _ => JobStatus::Created,
    }
}

/// Maps a provider validation verdict onto [`ValidationResult`].
///
/// Unknown verdicts are treated as errors; an artifact the provider
/// cannot vouch for never reaches submission.
fn validation_from_wire(dto: FileValidationDto) -> ValidationResult {
    let status = match dto.status.to_ascii_uppercase().as_str() {
        "NORMALIZED" | "VALIDATED" => ValidationStatus::Normalized,
        "WARNING" => ValidationStatus::Warning,
        "PENDING" | "VALIDATING" => ValidationStatus::Pending,
        "ERROR" | "REJECTED" => ValidationStatus::Error,
        other => {
            return ValidationResult::error(format!("Unrecognized validation status '{}'", other));
        }
    };
    ValidationResult {
        status,
        messages: dto.errors,
    }
}

/// Derives the provider's POD package id for a specification.
///
/// Uses the built-in template catalog when the trim matches one;
/// custom trims get a descriptive synthetic id.
fn pod_package_id(spec: &BookSpecification) -> String {
    for template in domain::TEMPLATES {
        if template.trim == spec.trim() {
            return template.pod_package_id.to_string();
        }
    }
    format!(
        "custom-{}x{}-{}-{}",
        spec.trim().width_mils(),
        spec.trim().height_mils(),
        spec.binding().as_str(),
        spec.paper().as_str()
    )
}

impl HttpPrintProvider {
    /// Creates a provider client with an empty token cache.
    pub fn new(config: ProviderConfig) -> Self {
        let tokens = TokenCache::new(config.token_refresh_skew);
        Self {
            client: reqwest::Client::new(),
            config,
            tokens,
        }
    }

    #[tracing::instrument(skip(self))]
    async fn authenticate(&self) -> Result<String, PipelineError> {
        let url = format!("{}/oauth2/token", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", OAUTH_SCOPE)])
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::AuthenticationFailed(format!(
                "Token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenDto = response
            .json()
            .await
            .map_err(|e| PipelineError::AuthenticationFailed(format!("Bad token response: {}", e)))?;

        let ttl = std::time::Duration::from_secs(
            token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        );
        self.tokens.store(&token.access_token, ttl);
        tracing::debug!("provider token refreshed");
        Ok(token.access_token)
    }

    async fn bearer(&self) -> Result<String, PipelineError> {
        if let Some(token) = self.tokens.get() {
            return Ok(token);
        }
        self.authenticate().await
    }

    /// Sends an authenticated request, retrying once with a fresh
    /// token on a 401.
    async fn send_authed(
        &self,
        build: impl Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PipelineError> {
        let token = self.bearer().await?;
        let response = build(&self.client, &token)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("Request failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.tokens.clear();
        let token = self.authenticate().await?;
        let response = build(&self.client, &token)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("Request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PipelineError::AuthenticationFailed(
                "Provider rejected a freshly issued token".to_string(),
            ));
        }
        Ok(response)
    }

    /// Sends the job-creation POST. Unlike [`Self::send_authed`],
    /// transport failures here are ambiguous: the request may have
    /// reached the provider before the connection died.
    async fn send_create(
        &self,
        url: &str,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<reqwest::Response, PipelineError> {
        self.client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| PipelineError::SubmissionFailed {
                reason: format!("Transport failure: {}", e),
                ambiguous: true,
            })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PipelineError> {
        response
            .json()
            .await
            .map_err(|e| PipelineError::Provider(format!("Bad response body: {}", e)))
    }
}

#[async_trait]
impl PrintProvider for HttpPrintProvider {
    #[tracing::instrument(skip(self, file), fields(role = %file.role))]
    async fn validate_file(&self, file: &StagedFile) -> Result<ValidationResult, PipelineError> {
        let url = format!("{}/print-job-file-validations/", self.config.base_url);
        let file_type = match file.role {
            FileRole::Interior => "interior",
            FileRole::Cover => "cover",
        };
        let body = serde_json::json!({
            "file_url": file.url,
            "file_type": file_type,
        });

        let response = self
            .send_authed(|client, token| client.post(&url).bearer_auth(token).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "Validation endpoint returned {}",
                response.status()
            )));
        }

        let dto: FileValidationDto = Self::read_json(response).await?;
        Ok(validation_from_wire(dto))
    }

    #[tracing::instrument(skip(self, submission), fields(external_id = %submission.external_id))]
    async fn create_print_job(
        &self,
        submission: &JobSubmission,
    ) -> Result<ProviderJob, PipelineError> {
        let url = format!("{}/print-jobs/", self.config.base_url);
        let body = serde_json::json!({
            "contact_email": submission.contact_email,
            "external_id": submission.external_id.as_str(),
            "line_items": [{
                "pod_package_id": pod_package_id(&submission.spec),
                "page_count": submission.spec.page_count(),
                "quantity": submission.quantity,
                "interior_file_url": submission.interior.url,
                "cover_file_url": submission.cover.url,
            }],
            "shipping_level": submission.shipping_level.as_str(),
        });

        let token = self.bearer().await?;
        let mut response = self.send_create(&url, &body, &token).await?;

        // A 401 is proof the provider refused the request before
        // opening a job, so one resend with a fresh token cannot
        // create a duplicate.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.clear();
            let token = self.authenticate().await?;
            response = self.send_create(&url, &body, &token).await?;

            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(PipelineError::AuthenticationFailed(
                    "Provider rejected a freshly issued token".to_string(),
                ));
            }
        }

        if !response.status().is_success() {
            return Err(PipelineError::SubmissionFailed {
                reason: format!("Provider returned {}", response.status()),
                ambiguous: false,
            });
        }

        let dto: PrintJobDto = Self::read_json(response).await?;
        Ok(dto.into())
    }

    #[tracing::instrument(skip(self))]
    async fn get_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError> {
        let url = format!("{}/print-jobs/{}/", self.config.base_url, job_id);
        let response = self
            .send_authed(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "Job fetch returned {}",
                response.status()
            )));
        }

        let dto: PrintJobDto = Self::read_json(response).await?;
        Ok(dto.into())
    }

    #[tracing::instrument(skip(self), fields(external_id = %external_id))]
    async fn find_job_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<ProviderJob>, PipelineError> {
        let url = format!("{}/print-jobs/", self.config.base_url);
        let response = self
            .send_authed(|client, token| {
                client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("external_id", external_id.as_str())])
            })
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "Job lookup returned {}",
                response.status()
            )));
        }

        let dto: PrintJobListDto = Self::read_json(response).await?;
        Ok(dto.results.into_iter().next().map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_print_job(&self, job_id: &str) -> Result<ProviderJob, PipelineError> {
        let url = format!("{}/print-jobs/{}/cancel/", self.config.base_url, job_id);
        let response = self
            .send_authed(|client, token| client.post(&url).bearer_auth(token))
            .await?;

        // The provider refuses cancellation once production started.
        if response.status() == reqwest::StatusCode::CONFLICT {
            let current = self.get_print_job(job_id).await?;
            return Err(PipelineError::CancellationRejected {
                status: current.status,
            });
        }

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "Cancellation returned {}",
                response.status()
            )));
        }

        let dto: PrintJobDto = Self::read_json(response).await?;
        Ok(dto.into())
    }
}
