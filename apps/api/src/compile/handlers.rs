//! Axum route handlers for compiling and serving PDFs.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::compile::hash::artifact_hash;
use crate::compile::CompileOutcome;
use crate::errors::{AppError, AppJson};
use crate::render::handlers::VariantRequest;
use crate::resume::parse_variant;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub success: bool,
    pub pdf_url: String,
    pub pdf_path: String,
    pub hash: String,
    pub cached: bool,
    pub logs: String,
}

/// POST /api/compile
///
/// Compiles the variant's current document, reusing a cached PDF when the
/// rendered source is unchanged. Compiler failures return 422 with the
/// parsed error lines and the full log.
pub async fn handle_compile(
    State(state): State<AppState>,
    AppJson(request): AppJson<VariantRequest>,
) -> Result<Json<CompileResponse>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;

    match state
        .compiler
        .compile_variant(&state.template, variant)
        .await?
    {
        CompileOutcome::Compiled {
            hash,
            location,
            cached,
            logs,
        } => Ok(Json(CompileResponse {
            success: true,
            pdf_url: format!("/pdfs/{hash}.pdf"),
            pdf_path: location,
            hash,
            cached,
            logs,
        })),
        CompileOutcome::Failed { logs, errors, .. } => Err(AppError::Compilation { logs, errors }),
    }
}

/// GET /pdfs/:file
pub async fn handle_get_pdf(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let hash =
        artifact_hash(&file).ok_or_else(|| AppError::NotFound(format!("PDF not found: {file}")))?;

    let data = state
        .compiler
        .artifacts()
        .read(hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("PDF not found: {file}")))?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], data))
}
