//! Persistent storage for compiled PDFs, addressed by content hash.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, info};

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Where the artifact for `hash` lives in this store.
    fn location_for(&self, hash: &str) -> String;

    /// Whether an artifact is stored under `hash`.
    async fn exists(&self, hash: &str) -> Result<bool>;

    /// Copies the compiled file at `artifact` into storage under `hash` and
    /// returns its location.
    async fn put(&self, hash: &str, artifact: &Path) -> Result<String>;

    /// Bytes of the artifact stored under `hash`, if any.
    async fn read(&self, hash: &str) -> Result<Option<Bytes>>;
}

// ────────────────────────────────────────────────────────────────────────────
// Local directory
// ────────────────────────────────────────────────────────────────────────────

/// Stores artifacts as `{dir}/{hash}.pdf`.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.pdf"))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn location_for(&self, hash: &str) -> String {
        self.path_for(hash).display().to_string()
    }

    async fn exists(&self, hash: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(hash))
            .await
            .unwrap_or(false))
    }

    async fn put(&self, hash: &str, artifact: &Path) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let target = self.path_for(hash);
        tokio::fs::copy(artifact, &target)
            .await
            .with_context(|| format!("Failed to store artifact at {}", target.display()))?;

        debug!("Stored artifact {}", target.display());
        Ok(self.location_for(hash))
    }

    async fn read(&self, hash: &str) -> Result<Option<Bytes>> {
        match tokio::fs::read(self.path_for(hash)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

/// Stores artifacts as `s3://{bucket}/pdfs/{hash}.pdf`.
#[derive(Clone)]
pub struct S3ArtifactStore {
    client: S3Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn key_for(hash: &str) -> String {
        format!("pdfs/{hash}.pdf")
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    fn location_for(&self, hash: &str) -> String {
        format!("s3://{}/{}", self.bucket, Self::key_for(hash))
    }

    async fn exists(&self, hash: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(Self::key_for(hash))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("S3 head failed for {hash}: {e}")),
        }
    }

    async fn put(&self, hash: &str, artifact: &Path) -> Result<String> {
        let key = Self::key_for(hash);
        let body = ByteStream::from_path(artifact)
            .await
            .with_context(|| format!("Failed to read {}", artifact.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        let location = self.location_for(hash);
        info!("Uploaded artifact to {location}");
        Ok(location)
    }

    async fn read(&self, hash: &str) -> Result<Option<Bytes>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(Self::key_for(hash))
            .send()
            .await;

        let object = match result {
            Ok(object) => object,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(anyhow::anyhow!("S3 download failed: {e}")),
        };

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?;
        Ok(Some(data.into_bytes()))
    }
}
