//! Axum route handlers for the AI editing API.
//! Each endpoint returns an unapplied proposal; nothing is persisted here.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::editing::bullet::edit_bullet;
use crate::editing::section::{edit_section, SectionKey};
use crate::editing::tailor::tailor_resume;
use crate::editing::EditProposal;
use crate::errors::{AppError, AppJson};
use crate::resume::{parse_variant, require_text};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditBulletRequest {
    pub variant_key: Option<String>,
    pub bullet_id: String,
    pub instruction: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditSectionRequest {
    pub variant_key: Option<String>,
    pub section_key: String,
    pub entry_id: Option<String>,
    pub instruction: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TailorRequest {
    pub variant_key: Option<String>,
    pub job_description: String,
    pub instruction: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/edit-bullet
pub async fn handle_edit_bullet(
    State(state): State<AppState>,
    AppJson(request): AppJson<EditBulletRequest>,
) -> Result<Json<EditProposal>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let bullet_id = require_text(&request.bullet_id, "bulletId")?;
    let instruction = require_text(&request.instruction, "instruction")?;

    let proposal = edit_bullet(
        state.store.as_ref(),
        state.llm.as_ref(),
        variant,
        bullet_id,
        instruction,
    )
    .await?;

    Ok(Json(proposal))
}

/// POST /api/ai/edit-section
///
/// `entryId` narrows the edit to one entry of education, experience or projects.
pub async fn handle_edit_section(
    State(state): State<AppState>,
    AppJson(request): AppJson<EditSectionRequest>,
) -> Result<Json<EditProposal>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let section: SectionKey = require_text(&request.section_key, "sectionKey")?.parse()?;
    let instruction = require_text(&request.instruction, "instruction")?;

    let proposal = edit_section(
        state.store.as_ref(),
        state.llm.as_ref(),
        variant,
        section,
        request.entry_id.as_deref(),
        instruction,
    )
    .await?;

    Ok(Json(proposal))
}

/// POST /api/ai/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    AppJson(request): AppJson<TailorRequest>,
) -> Result<Json<EditProposal>, AppError> {
    let variant = parse_variant(request.variant_key.as_deref())?;
    let job_description = require_text(&request.job_description, "jobDescription")?;

    let proposal = tailor_resume(
        state.store.as_ref(),
        state.llm.as_ref(),
        variant,
        job_description,
        request.instruction.as_deref(),
    )
    .await?;

    Ok(Json(proposal))
}
