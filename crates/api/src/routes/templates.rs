//! Book template catalog endpoint.

use axum::Json;
use domain::TEMPLATES;
use serde::Serialize;

#[derive(Serialize)]
pub struct TemplateResponse {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub trim: String,
    pub pod_package_id: &'static str,
}

/// GET /templates — lists the built-in book templates.
pub async fn list() -> Json<Vec<TemplateResponse>> {
    let templates = TEMPLATES
        .iter()
        .map(|t| TemplateResponse {
            id: t.id,
            name: t.name,
            description: t.description,
            trim: t.trim.to_string(),
            pod_package_id: t.pod_package_id,
        })
        .collect();
    Json(templates)
}
