//! HTTP API server with observability for the print-order pipeline.
//!
//! Provides REST endpoints for quoting, order submission, status
//! polling, and cancellation, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::{
    InMemoryLicenseGate, InMemoryObjectStorage, InMemoryPrintProvider, LicenseGate, ObjectStorage,
    OrderPipeline, PrintProvider,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P, L>(state: Arc<AppState<S, P, L>>, metrics_handle: PrometheusHandle) -> Router
where
    S: ObjectStorage + 'static,
    P: PrintProvider + 'static,
    L: LicenseGate + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/templates", get(routes::templates::list))
        .route("/quotes", post(routes::quotes::create::<S, P, L>))
        .route("/orders", post(routes::orders::submit::<S, P, L>))
        .route("/orders/{external_id}", get(routes::orders::status::<S, P, L>))
        .route(
            "/orders/{external_id}/cancel",
            post(routes::orders::cancel::<S, P, L>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Application state backed entirely by in-memory services.
///
/// Used in dev mode and in tests. The license gate grants every
/// feature so express shipping and bulk orders work out of the box.
pub type DevState = AppState<InMemoryObjectStorage, InMemoryPrintProvider, InMemoryLicenseGate>;

/// Creates the default in-memory application state.
///
/// Returns handles to the underlying services alongside the state so
/// callers can script provider verdicts and inspect stored objects.
pub fn create_default_state() -> (
    Arc<DevState>,
    InMemoryObjectStorage,
    InMemoryPrintProvider,
    InMemoryLicenseGate,
) {
    let storage = InMemoryObjectStorage::new();
    let provider = InMemoryPrintProvider::new();
    let license = InMemoryLicenseGate::allowing_all();

    let pipeline = OrderPipeline::new(storage.clone(), provider.clone(), license.clone());
    let state = Arc::new(AppState { pipeline });

    (state, storage, provider, license)
}
