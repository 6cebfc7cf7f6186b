// Document Store operations exposed over HTTP: fetch, apply-patch, and the
// append-only version history.

pub mod handlers;
pub mod versions;

use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, VariantKey};
use crate::store::ResumeStore;

/// Parses a request's variant key, rejecting missing or unrecognised values.
pub fn parse_variant(raw: Option<&str>) -> Result<VariantKey, AppError> {
    raw.filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("variantKey is required".to_string()))?
        .parse()
        .map_err(|_| AppError::Validation("Invalid variant key".to_string()))
}

/// Loads the current document of `variant`, or a not-found error.
pub async fn load_resume(
    store: &dyn ResumeStore,
    variant: VariantKey,
) -> Result<ResumeDocument, AppError> {
    store
        .get_resume(variant)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume not found: {variant}")))
}

/// Rejects a blank required request field.
pub fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value)
}
