//! Axum route handlers for the resume document API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppJson};
use crate::models::resume::ResumeDocument;
use crate::models::version::ResumeVersion;
use crate::patch::apply_patch_to_variant;
use crate::resume::versions::{self, VersionDetail};
use crate::resume::{load_resume, parse_variant};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantQuery {
    pub variant_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyPatchRequest {
    pub variant_key: Option<String>,
    pub patches: Option<Vec<Value>>,
    pub base_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyPatchResponse {
    pub success: bool,
    pub resume: ResumeDocument,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveVersionRequest {
    pub variant_key: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVersionResponse {
    pub success: bool,
    pub version_id: i64,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/resume?variantKey=
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
) -> Result<Json<ResumeDocument>, AppError> {
    let variant = parse_variant(query.variant_key.as_deref())?;
    let resume = load_resume(state.store.as_ref(), variant).await?;
    Ok(Json(resume))
}

/// POST /api/resume/apply-patch
///
/// All operations apply, or none do. Failures distinguish `PATCH_INVALID`
/// from `SCHEMA_INVALID`.
pub async fn handle_apply_patch(
    State(state): State<AppState>,
    AppJson(request): AppJson<ApplyPatchRequest>,
) -> Result<Json<ApplyPatchResponse>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let patches = request
        .patches
        .ok_or_else(|| AppError::Validation("patches must be an array".to_string()))?;

    let resume = apply_patch_to_variant(
        state.store.as_ref(),
        variant,
        &patches,
        request.base_path.as_deref(),
    )
    .await?;

    Ok(Json(ApplyPatchResponse {
        success: true,
        resume,
    }))
}

/// POST /api/resume/save
pub async fn handle_save_version(
    State(state): State<AppState>,
    AppJson(request): AppJson<SaveVersionRequest>,
) -> Result<Json<SaveVersionResponse>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let version_id =
        versions::save_version(state.store.as_ref(), variant, request.note.as_deref()).await?;

    Ok(Json(SaveVersionResponse {
        success: true,
        version_id,
        message: format!("Saved version {version_id} of {variant}"),
    }))
}

/// GET /api/resume/versions?variantKey=
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
) -> Result<Json<Vec<ResumeVersion>>, AppError> {
    let variant = parse_variant(query.variant_key.as_deref())?;
    let versions = versions::list_versions(state.store.as_ref(), variant).await?;
    Ok(Json(versions))
}

/// GET /api/resume/version/:id
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VersionDetail>, AppError> {
    let detail = versions::get_version(state.store.as_ref(), id).await?;
    Ok(Json(detail))
}
