//! Append-only version history of a variant's document.

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, VariantKey};
use crate::models::version::ResumeVersion;
use crate::resume::load_resume;
use crate::store::ResumeStore;

/// A stored version together with its decoded document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetail {
    #[serde(flatten)]
    pub version: ResumeVersion,
    pub resume: ResumeDocument,
}

/// Snapshots the current document of `variant` and returns the new version id.
pub async fn save_version(
    store: &dyn ResumeStore,
    variant: VariantKey,
    note: Option<&str>,
) -> Result<i64, AppError> {
    let resume = load_resume(store, variant).await?;
    let content = serde_json::to_string(&resume).map_err(anyhow::Error::from)?;
    let note = note.map(str::trim).filter(|n| !n.is_empty());

    let id = store.insert_version(variant, &content, note).await?;
    info!("Saved version {id} of {variant}");
    Ok(id)
}

/// Versions of `variant`, newest first.
pub async fn list_versions(
    store: &dyn ResumeStore,
    variant: VariantKey,
) -> Result<Vec<ResumeVersion>, AppError> {
    Ok(store.list_versions(variant).await?)
}

pub async fn get_version(store: &dyn ResumeStore, id: i64) -> Result<VersionDetail, AppError> {
    let version = store
        .get_version(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Version not found: {id}")))?;

    let resume: ResumeDocument = serde_json::from_str(&version.json_content)
        .map_err(|e| anyhow::anyhow!("Version {id} holds an unreadable document: {e}"))?;

    Ok(VersionDetail { version, resume })
}
