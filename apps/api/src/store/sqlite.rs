use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::db::create_pool;
use crate::models::resume::{ResumeDocument, VariantKey};
use crate::models::version::ResumeVersion;
use crate::store::ResumeStore;

#[derive(Debug, FromRow)]
struct VersionRow {
    id: i64,
    variant_key: String,
    json_content: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for ResumeVersion {
    type Error = anyhow::Error;

    fn try_from(row: VersionRow) -> Result<Self> {
        Ok(ResumeVersion {
            id: row.id,
            variant_key: row.variant_key.parse()?,
            json_content: row.json_content,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

/// `ResumeStore` backed by a SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self {
            pool: create_pool(database_url).await?,
        })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect("sqlite::memory:")
            .await
            .expect("in-memory SQLite should open")
    }
}

#[async_trait]
impl ResumeStore for SqliteStore {
    async fn get_resume(&self, variant: VariantKey) -> Result<Option<ResumeDocument>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT json_content FROM resumes WHERE variant_key = ?")
                .bind(variant.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(json,)| {
            serde_json::from_str(&json)
                .with_context(|| format!("Stored document for {variant} is not valid JSON"))
        })
        .transpose()
    }

    async fn save_resume(&self, resume: &ResumeDocument) -> Result<()> {
        let json = serde_json::to_string(resume)?;

        sqlx::query(
            r#"
            INSERT INTO resumes (variant_key, json_content, last_compiled_hash, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(variant_key)
            DO UPDATE SET
                json_content = excluded.json_content,
                last_compiled_hash = excluded.last_compiled_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(resume.variant_key.as_str())
        .bind(&json)
        .bind(resume.metadata.last_compiled_hash.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!("Saved current document for {}", resume.variant_key);
        Ok(())
    }

    async fn insert_version(
        &self,
        variant: VariantKey,
        json_content: &str,
        note: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO resume_versions (variant_key, json_content, note, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(variant.as_str())
        .bind(json_content)
        .bind(note)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Inserted version {id} for {variant}");
        Ok(id)
    }

    async fn list_versions(&self, variant: VariantKey) -> Result<Vec<ResumeVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT id, variant_key, json_content, note, created_at
            FROM resume_versions
            WHERE variant_key = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(variant.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResumeVersion::try_from).collect()
    }

    async fn get_version(&self, id: i64) -> Result<Option<ResumeVersion>> {
        let row = sqlx::query_as::<_, VersionRow>(
            "SELECT id, variant_key, json_content, note, created_at FROM resume_versions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResumeVersion::try_from).transpose()
    }

    async fn cached_pdf(&self, latex_hash: &str) -> Result<Option<String>> {
        Ok(
            sqlx::query_scalar("SELECT pdf_path FROM compiled_pdfs WHERE latex_hash = ?")
                .bind(latex_hash)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn record_pdf(&self, latex_hash: &str, location: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO compiled_pdfs (latex_hash, pdf_path, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(latex_hash) DO NOTHING
            "#,
        )
        .bind(latex_hash)
        .bind(location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_compiled_hash(&self, variant: VariantKey, latex_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE resumes
            SET json_content = json_set(json_content, '$.metadata.lastCompiledHash', ?),
                last_compiled_hash = ?
            WHERE variant_key = ?
            "#,
        )
        .bind(latex_hash)
        .bind(latex_hash)
        .bind(variant.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("SQLite pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::sample_resume;

    #[tokio::test]
    async fn test_get_resume_missing_variant_returns_none() {
        let store = SqliteStore::in_memory().await;
        assert!(store.get_resume(VariantKey::AiMl).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_resume_upserts_by_variant() {
        let store = SqliteStore::in_memory().await;
        let mut doc = sample_resume(VariantKey::AiMl);
        store.save_resume(&doc).await.unwrap();

        doc.heading.name = "Grace Hopper".to_string();
        store.save_resume(&doc).await.unwrap();

        let stored = store.get_resume(VariantKey::AiMl).await.unwrap().unwrap();
        assert_eq!(stored.heading.name, "Grace Hopper");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resumes")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_versions_listed_newest_first() {
        let store = SqliteStore::in_memory().await;
        let first = store
            .insert_version(VariantKey::FullStack, "{}", Some("first"))
            .await
            .unwrap();
        let second = store
            .insert_version(VariantKey::FullStack, "{}", None)
            .await
            .unwrap();
        store
            .insert_version(VariantKey::AiMl, "{}", None)
            .await
            .unwrap();

        assert!(second > first);
        let versions = store.list_versions(VariantKey::FullStack).await.unwrap();
        let ids: Vec<i64> = versions.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(versions[0].created_at >= versions[1].created_at);
        assert_eq!(versions[1].note.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_get_version_by_id() {
        let store = SqliteStore::in_memory().await;
        let id = store
            .insert_version(VariantKey::BackendCloud, "{\"a\":1}", Some("note"))
            .await
            .unwrap();

        let version = store.get_version(id).await.unwrap().unwrap();
        assert_eq!(version.variant_key, VariantKey::BackendCloud);
        assert_eq!(version.json_content, "{\"a\":1}");
        assert!(store.get_version(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_pdf_repeat_insert_is_noop() {
        let store = SqliteStore::in_memory().await;
        store.record_pdf("abc", "/tmp/abc.pdf").await.unwrap();
        store.record_pdf("abc", "/elsewhere/abc.pdf").await.unwrap();

        assert_eq!(
            store.cached_pdf("abc").await.unwrap().as_deref(),
            Some("/tmp/abc.pdf")
        );
        assert!(store.cached_pdf("def").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_compiled_hash_stamps_metadata() {
        let store = SqliteStore::in_memory().await;
        store
            .save_resume(&sample_resume(VariantKey::AiMl))
            .await
            .unwrap();

        store
            .update_compiled_hash(VariantKey::AiMl, "deadbeef")
            .await
            .unwrap();

        let stored = store.get_resume(VariantKey::AiMl).await.unwrap().unwrap();
        assert_eq!(
            stored.metadata.last_compiled_hash.as_deref(),
            Some("deadbeef")
        );
    }
}
