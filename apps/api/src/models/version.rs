use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::resume::VariantKey;

/// An immutable snapshot of a variant's document, created by "save version".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeVersion {
    pub id: i64,
    pub variant_key: VariantKey,
    pub json_content: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
