//! Axum route handler for LaTeX preview.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppJson};
use crate::render::render_resume;
use crate::resume::{load_resume, parse_variant};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantRequest {
    pub variant_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub success: bool,
    pub latex: String,
}

/// POST /api/render
///
/// Returns the full LaTeX source without compiling it.
pub async fn handle_render(
    State(state): State<AppState>,
    AppJson(request): AppJson<VariantRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let resume = load_resume(state.store.as_ref(), variant).await?;

    Ok(Json(RenderResponse {
        success: true,
        latex: render_resume(&state.template, &resume),
    }))
}
