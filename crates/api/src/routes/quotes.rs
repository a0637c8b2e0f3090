//! Quote endpoint: price an order without starting an attempt.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{
    BindingType, BookSpecification, CostCalculation, PaperType, ShippingLevel, TrimSize,
    template_by_id,
};
use pipeline::{LicenseGate, ObjectStorage, PrintProvider};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Book specification fields shared by quotes and order submissions.
///
/// Either `template_id` or both trim dimensions must be given. Binding
/// and paper default to perfect-bound on white stock, matching the
/// template catalog.
#[derive(Debug, Deserialize)]
pub struct SpecRequest {
    pub template_id: Option<String>,
    pub trim_width_mils: Option<u32>,
    pub trim_height_mils: Option<u32>,
    #[serde(default)]
    pub binding: BindingType,
    #[serde(default)]
    pub paper: PaperType,
    pub page_count: u32,
}

impl SpecRequest {
    pub fn build(&self) -> Result<BookSpecification, ApiError> {
        let trim = match (&self.template_id, self.trim_width_mils, self.trim_height_mils) {
            (Some(id), _, _) => template_by_id(id)?.trim,
            (None, Some(width), Some(height)) => TrimSize::new(width, height)?,
            (None, _, _) => {
                return Err(ApiError::BadRequest(
                    "Either template_id or both trim_width_mils and trim_height_mils are required"
                        .to_string(),
                ));
            }
        };
        Ok(BookSpecification::new(
            trim,
            self.binding,
            self.paper,
            self.page_count,
        )?)
    }
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub spec: SpecRequest,
    pub quantity: u32,
    #[serde(default)]
    pub shipping_level: ShippingLevel,
}

/// Cost breakdown in cents, as returned to clients.
#[derive(Serialize)]
pub struct CostResponse {
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub discount_tier: String,
    pub taxes_cents: i64,
    pub fulfillment_fee_cents: i64,
    pub shipping_cost_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub cost_per_unit_cents: i64,
    pub suggested_retail_price_cents: i64,
    pub quantity: u32,
    pub shipping_level: String,
}

impl From<&CostCalculation> for CostResponse {
    fn from(cost: &CostCalculation) -> Self {
        Self {
            unit_price_cents: cost.unit_price.cents(),
            discount_cents: cost.discount.cents(),
            discount_tier: cost.discount_tier.clone(),
            taxes_cents: cost.taxes.cents(),
            fulfillment_fee_cents: cost.fulfillment_fee.cents(),
            shipping_cost_cents: cost.shipping_cost.cents(),
            subtotal_cents: cost.subtotal.cents(),
            total_cents: cost.total.cents(),
            cost_per_unit_cents: cost.cost_per_unit().cents(),
            suggested_retail_price_cents: cost.suggested_retail_price().cents(),
            quantity: cost.quantity,
            shipping_level: cost.shipping_level.as_str().to_string(),
        }
    }
}

/// POST /quotes — price a specification, quantity, and shipping level.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, P, L>(
    State(state): State<Arc<AppState<S, P, L>>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<CostResponse>, ApiError>
where
    S: ObjectStorage + 'static,
    P: PrintProvider + 'static,
    L: LicenseGate + 'static,
{
    let spec = req.spec.build()?;
    let cost = state
        .pipeline
        .quote(&spec, req.quantity, req.shipping_level)?;
    Ok(Json(CostResponse::from(&cost)))
}
