//! The validate → apply → re-validate gate guarding every document write.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, VariantKey};
use crate::patch::apply::{apply_operations, validate_operations};
use crate::patch::operation::{parse_operations, PatchOperation};
use crate::patch::pointer::JsonPointer;
use crate::patch::schema::{validate_resume_value, SchemaViolation};
use crate::patch::PatchError;
use crate::resume::load_resume;
use crate::store::ResumeStore;

/// Why a patch set was refused. The stored document is untouched in both cases.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchRejection {
    /// An operation could not be applied to the current document.
    Patch(Vec<PatchError>),
    /// The operations applied, but the result is not a valid resume.
    Schema(Vec<SchemaViolation>),
}

impl From<PatchRejection> for AppError {
    fn from(rejection: PatchRejection) -> Self {
        match rejection {
            PatchRejection::Patch(errors) => AppError::PatchRejected(errors),
            PatchRejection::Schema(violations) => AppError::SchemaRejected(violations),
        }
    }
}

/// Runs the three phases against `current` and returns the candidate document.
/// Pure: persistence is the caller's job.
pub fn patch_document(
    current: &Value,
    variant: VariantKey,
    ops: &[PatchOperation],
) -> Result<ResumeDocument, PatchRejection> {
    // Phase 1: every operation must apply, in order, before anything is applied.
    validate_operations(current, ops).map_err(PatchRejection::Patch)?;

    // Phase 2: apply the whole sequence to a fresh copy as one unit.
    let candidate =
        apply_operations(current, ops).map_err(|e| PatchRejection::Patch(vec![e]))?;

    // Phase 3: the result must still be a resume for this variant.
    validate_resume_value(&candidate, variant).map_err(PatchRejection::Schema)
}

/// Applies `raw_ops` to the current document of `variant` and persists the
/// result with a fresh `updatedAt`. When `base_path` is given, operation
/// paths are resolved relative to it.
pub async fn apply_patch_to_variant(
    store: &dyn ResumeStore,
    variant: VariantKey,
    raw_ops: &[Value],
    base_path: Option<&str>,
) -> Result<ResumeDocument, AppError> {
    let base = match base_path {
        Some(raw) => JsonPointer::parse(raw)
            .map_err(|e| AppError::Validation(format!("basePath: {e}")))?,
        None => JsonPointer::root(),
    };

    let current = load_resume(store, variant).await?;

    let ops: Vec<PatchOperation> = parse_operations(raw_ops)
        .map_err(AppError::PatchRejected)?
        .into_iter()
        .map(|op| op.rebased(&base))
        .collect();

    let current = serde_json::to_value(&current).map_err(anyhow::Error::from)?;

    let mut next = patch_document(&current, variant, &ops).map_err(|rejection| {
        warn!("Rejected patch of {} operations for {variant}: {rejection:?}", ops.len());
        AppError::from(rejection)
    })?;

    next.metadata.updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    store.save_resume(&next).await?;

    info!("Applied {} patch operations to {variant}", ops.len());
    Ok(next)
}
