//! Order submission, status, and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use domain::{ExternalId, PrintJob, ShippingLevel};
use pipeline::{LicenseGate, ObjectStorage, OrderPipeline, OrderRequest, PrintProvider};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::quotes::{CostResponse, SpecRequest};

/// Shared application state accessible from all handlers.
pub struct AppState<S: ObjectStorage, P: PrintProvider, L: LicenseGate> {
    pub pipeline: OrderPipeline<S, P, L>,
}

// -- Request types --

/// The JSON `order` part of a multipart submission.
#[derive(Deserialize)]
pub struct OrderMetaRequest {
    #[serde(flatten)]
    pub spec: SpecRequest,
    pub quantity: u32,
    #[serde(default)]
    pub shipping_level: ShippingLevel,
    pub contact_email: String,
    pub external_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct JobResponse {
    pub id: String,
    pub external_id: String,
    pub status: String,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<String>,
    pub created_at: String,
    pub contact_email: String,
    pub cost: CostResponse,
}

impl From<&PrintJob> for JobResponse {
    fn from(job: &PrintJob) -> Self {
        Self {
            id: job.id.clone(),
            external_id: job.external_id.as_str().to_string(),
            status: job.status.as_str().to_string(),
            tracking_url: job.tracking_url.clone(),
            estimated_delivery: job.estimated_delivery.map(|d| d.to_rfc3339()),
            created_at: job.created_at.to_rfc3339(),
            contact_email: job.contact_email.clone(),
            cost: CostResponse::from(&job.cost),
        }
    }
}

// -- Handlers --

/// POST /orders — submit an order through the pipeline.
///
/// Expects three multipart parts: `order` (JSON metadata), `interior`
/// (interior file bytes), and `cover` (cover file bytes). Resubmitting
/// with an already-recorded external id returns the existing job.
#[tracing::instrument(skip(state, multipart))]
pub async fn submit<S, P, L>(
    State(state): State<Arc<AppState<S, P, L>>>,
    mut multipart: Multipart,
) -> Result<(axum::http::StatusCode, Json<JobResponse>), ApiError>
where
    S: ObjectStorage + 'static,
    P: PrintProvider + 'static,
    L: LicenseGate + 'static,
{
    let mut meta: Option<OrderMetaRequest> = None;
    let mut interior: Option<Vec<u8>> = None;
    let mut cover: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read part {name}: {e}")))?;
        match name.as_str() {
            "order" => {
                meta = Some(serde_json::from_slice(&bytes).map_err(|e| {
                    ApiError::BadRequest(format!("Invalid order metadata: {e}"))
                })?);
            }
            "interior" => interior = Some(bytes.to_vec()),
            "cover" => cover = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let meta = meta.ok_or_else(|| ApiError::BadRequest("Missing order part".to_string()))?;
    let interior =
        interior.ok_or_else(|| ApiError::BadRequest("Missing interior part".to_string()))?;
    let cover = cover.ok_or_else(|| ApiError::BadRequest("Missing cover part".to_string()))?;

    let spec = meta.spec.build()?;
    let request = OrderRequest {
        spec,
        quantity: meta.quantity,
        shipping_level: meta.shipping_level,
        interior,
        cover,
        contact_email: meta.contact_email,
        external_id: ExternalId::new(meta.external_id),
    };

    let job = state.pipeline.submit_order(request).await?;

    Ok((axum::http::StatusCode::CREATED, Json(JobResponse::from(&job))))
}

/// GET /orders/:external_id — poll the job status.
///
/// Refreshes against the provider unless the job is already terminal.
#[tracing::instrument(skip(state))]
pub async fn status<S, P, L>(
    State(state): State<Arc<AppState<S, P, L>>>,
    Path(external_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError>
where
    S: ObjectStorage + 'static,
    P: PrintProvider + 'static,
    L: LicenseGate + 'static,
{
    let job = state
        .pipeline
        .poll_status(&ExternalId::new(external_id))
        .await?;
    Ok(Json(JobResponse::from(&job)))
}

/// POST /orders/:external_id/cancel — request cancellation of a job.
#[tracing::instrument(skip(state))]
pub async fn cancel<S, P, L>(
    State(state): State<Arc<AppState<S, P, L>>>,
    Path(external_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError>
where
    S: ObjectStorage + 'static,
    P: PrintProvider + 'static,
    L: LicenseGate + 'static,
{
    let job = state
        .pipeline
        .cancel_job(&ExternalId::new(external_id))
        .await?;
    Ok(Json(JobResponse::from(&job)))
}
