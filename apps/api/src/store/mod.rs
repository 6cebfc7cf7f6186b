//! Document Store: the current document per variant, its version history,
//! and the hash → artifact mapping of the compilation cache.
//!
//! The store is constructed once at startup and injected into the app state
//! as a trait object; the only mutation points are the variant upsert and the
//! cache's insert-or-ignore.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::resume::{ResumeDocument, VariantKey};
use crate::models::version::ResumeVersion;

pub mod sqlite;

pub use sqlite::SqliteStore;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get_resume(&self, variant: VariantKey) -> Result<Option<ResumeDocument>>;

    /// Upserts the current document for `resume.variant_key` (last writer wins).
    async fn save_resume(&self, resume: &ResumeDocument) -> Result<()>;

    /// Appends a snapshot. Returns the new, monotonically increasing version id.
    async fn insert_version(
        &self,
        variant: VariantKey,
        json_content: &str,
        note: Option<&str>,
    ) -> Result<i64>;

    /// Versions for one variant, newest first.
    async fn list_versions(&self, variant: VariantKey) -> Result<Vec<ResumeVersion>>;

    async fn get_version(&self, id: i64) -> Result<Option<ResumeVersion>>;

    /// Storage location of the artifact compiled from `latex_hash`, if recorded.
    async fn cached_pdf(&self, latex_hash: &str) -> Result<Option<String>>;

    /// Records `latex_hash → location`. A repeat insert for the same hash is a no-op.
    async fn record_pdf(&self, latex_hash: &str, location: &str) -> Result<()>;

    /// Stamps `metadata.lastCompiledHash` on the variant's current document.
    async fn update_compiled_hash(&self, variant: VariantKey, latex_hash: &str) -> Result<()>;

    async fn close(&self);
}
