//! The content-addressed compile cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::compile::artifacts::ArtifactStore;
use crate::compile::compiler::{output_paths, parse_latex_errors, LatexCompiler};
use crate::compile::hash::content_hash;
use crate::errors::AppError;
use crate::models::resume::VariantKey;
use crate::render::{render_resume, LatexTemplate};
use crate::resume::load_resume;
use crate::store::ResumeStore;

const SOURCE_FILE: &str = "resume.tex";

/// Result of one compile request. Both arms are normal outcomes; `Err` from
/// [`CompileService::compile`] is reserved for storage faults.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    Compiled {
        hash: String,
        location: String,
        cached: bool,
        logs: String,
    },
    Failed {
        hash: String,
        logs: String,
        errors: Vec<String>,
    },
}

impl CompileOutcome {
    pub fn hash(&self) -> &str {
        match self {
            CompileOutcome::Compiled { hash, .. } | CompileOutcome::Failed { hash, .. } => hash,
        }
    }
}

/// What happened inside a working area.
enum WorkResult {
    Artifact { location: String, logs: String },
    Failed { logs: String, errors: Vec<String> },
}

pub struct CompileService {
    store: Arc<dyn ResumeStore>,
    artifacts: Arc<dyn ArtifactStore>,
    compiler: Arc<dyn LatexCompiler>,
    work_root: PathBuf,
}

impl CompileService {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        artifacts: Arc<dyn ArtifactStore>,
        compiler: Arc<dyn LatexCompiler>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            artifacts,
            compiler,
            work_root: work_root.into(),
        }
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    /// Returns a stored artifact for `source`, compiling it on a cache miss.
    pub async fn compile(&self, source: &str) -> Result<CompileOutcome> {
        let hash = content_hash(source);

        if let Some(location) = self.lookup(&hash).await? {
            info!("Cache hit for {hash}");
            return Ok(CompileOutcome::Compiled {
                hash,
                location,
                cached: true,
                logs: "Using cached PDF".to_string(),
            });
        }
        info!("Cache miss for {hash}, compiling");

        tokio::fs::create_dir_all(&self.work_root)
            .await
            .with_context(|| format!("Failed to create {}", self.work_root.display()))?;
        let work_dir = tempfile::Builder::new()
            .prefix("compile-")
            .tempdir_in(&self.work_root)
            .context("Failed to create compile working directory")?;

        let result = self.compile_in(work_dir.path(), &hash, source).await;
        remove_work_dir(work_dir);

        Ok(match result? {
            WorkResult::Artifact { location, logs } => CompileOutcome::Compiled {
                hash,
                location,
                cached: false,
                logs,
            },
            WorkResult::Failed { logs, errors } => {
                warn!("Compilation of {hash} failed: {}", errors.join(" | "));
                CompileOutcome::Failed { hash, logs, errors }
            }
        })
    }

    /// Renders the current document of `variant` and compiles it. On success
    /// the document's `lastCompiledHash` is updated.
    pub async fn compile_variant(
        &self,
        template: &LatexTemplate,
        variant: VariantKey,
    ) -> Result<CompileOutcome, AppError> {
        let resume = load_resume(self.store.as_ref(), variant).await?;
        let source = render_resume(template, &resume);
        let outcome = self.compile(&source).await?;

        if let CompileOutcome::Compiled { hash, .. } = &outcome {
            self.store.update_compiled_hash(variant, hash).await?;
        }
        info!("Compile of {variant} finished for {}", outcome.hash());
        Ok(outcome)
    }

    /// A hit needs a recorded mapping and an artifact stored under `hash` in
    /// the current backend. The reported location is always the one the
    /// current backend serves from.
    async fn lookup(&self, hash: &str) -> Result<Option<String>> {
        let Some(recorded) = self.store.cached_pdf(hash).await? else {
            return Ok(None);
        };
        if self.artifacts.exists(hash).await? {
            return Ok(Some(self.artifacts.location_for(hash)));
        }
        warn!("Cached artifact for {hash} (recorded at {recorded}) is missing, recompiling");
        Ok(None)
    }

    async fn compile_in(&self, work_dir: &Path, hash: &str, source: &str) -> Result<WorkResult> {
        let tex_file = work_dir.join(SOURCE_FILE);
        tokio::fs::write(&tex_file, source)
            .await
            .with_context(|| format!("Failed to write {}", tex_file.display()))?;

        let run = match self.compiler.run(work_dir, &tex_file).await {
            Ok(run) => run,
            Err(e) => {
                let message = e.to_string();
                return Ok(WorkResult::Failed {
                    logs: message.clone(),
                    errors: vec![message],
                });
            }
        };

        let (pdf, log_file) = output_paths(work_dir, &tex_file);
        if !tokio::fs::try_exists(&pdf).await.unwrap_or(false) {
            let logs = match tokio::fs::read_to_string(&log_file).await {
                Ok(log) => log,
                Err(_) => format!("{}\n{}", run.stdout, run.stderr),
            };
            let errors = parse_latex_errors(&logs);
            return Ok(WorkResult::Failed { logs, errors });
        }

        let location = self.artifacts.put(hash, &pdf).await?;
        self.store.record_pdf(hash, &location).await?;
        info!("Stored artifact for {hash} at {location}");

        Ok(WorkResult::Artifact {
            location,
            logs: run.stdout,
        })
    }
}

/// Removes a working area. A directory that is already gone counts as removed.
fn remove_work_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove working directory {}: {e}", path.display());
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubBehaviour, StubCompiler};
    use super::*;
    use crate::compile::artifacts::LocalArtifactStore;
    use crate::models::resume::fixtures::sample_resume;
    use crate::store::SqliteStore;

    struct Harness {
        service: CompileService,
        compiler: Arc<StubCompiler>,
        store: Arc<SqliteStore>,
        _dir: TempDir,
    }

    async fn harness(behaviour: StubBehaviour) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::in_memory().await);
        let compiler = Arc::new(StubCompiler::new(behaviour));
        let service = CompileService::new(
            store.clone(),
            Arc::new(LocalArtifactStore::new(dir.path().join("pdfs"))),
            compiler.clone(),
            dir.path().join("work"),
        );
        Harness {
            service,
            compiler,
            store,
            _dir: dir,
        }
    }

    const SOURCE: &str = "\\documentclass{article}\\begin{document}hi\\end{document}";

    #[tokio::test]
    async fn test_second_compile_hits_cache_without_running_compiler() {
        let h = harness(StubBehaviour::Succeed).await;

        let first = h.service.compile(SOURCE).await.unwrap();
        let second = h.service.compile(SOURCE).await.unwrap();

        assert!(matches!(first, CompileOutcome::Compiled { cached: false, .. }));
        assert!(matches!(second, CompileOutcome::Compiled { cached: true, .. }));
        assert_eq!(first.hash(), second.hash());
        assert_eq!(h.compiler.runs(), 1);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_recompiled_and_restored() {
        let h = harness(StubBehaviour::Succeed).await;

        let CompileOutcome::Compiled { location, .. } = h.service.compile(SOURCE).await.unwrap()
        else {
            panic!("expected a compiled artifact");
        };
        std::fs::remove_file(&location).unwrap();

        let again = h.service.compile(SOURCE).await.unwrap();
        assert!(matches!(again, CompileOutcome::Compiled { cached: false, .. }));
        assert_eq!(h.compiler.runs(), 2);
        assert!(Path::new(&location).exists());
        assert_eq!(
            h.store.cached_pdf(&content_hash(SOURCE)).await.unwrap(),
            Some(location)
        );
    }

    /// A service over `pdfs` whose mapping for SOURCE points into `old`.
    async fn harness_with_stale_mapping(old_file_present: bool) -> Harness {
        let h = harness(StubBehaviour::Succeed).await;
        let hash = content_hash(SOURCE);
        let old_dir = h._dir.path().join("old");
        let old_location = old_dir.join(format!("{hash}.pdf"));
        if old_file_present {
            std::fs::create_dir_all(&old_dir).unwrap();
            std::fs::write(&old_location, b"%PDF-old").unwrap();
        }
        h.store
            .record_pdf(&hash, &old_location.display().to_string())
            .await
            .unwrap();
        h
    }

    #[tokio::test]
    async fn test_stale_mapping_from_another_directory_heals_after_one_compile() {
        let h = harness_with_stale_mapping(false).await;

        let first = h.service.compile(SOURCE).await.unwrap();
        let second = h.service.compile(SOURCE).await.unwrap();
        let third = h.service.compile(SOURCE).await.unwrap();

        assert!(matches!(first, CompileOutcome::Compiled { cached: false, .. }));
        assert!(matches!(second, CompileOutcome::Compiled { cached: true, .. }));
        assert!(matches!(third, CompileOutcome::Compiled { cached: true, .. }));
        assert_eq!(h.compiler.runs(), 1);
        assert!(h
            .service
            .artifacts()
            .read(&content_hash(SOURCE))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_hit_location_is_always_servable() {
        let h = harness_with_stale_mapping(true).await;
        let hash = content_hash(SOURCE);

        let first = h.service.compile(SOURCE).await.unwrap();
        assert!(matches!(first, CompileOutcome::Compiled { cached: false, .. }));
        assert_eq!(h.compiler.runs(), 1);

        let CompileOutcome::Compiled {
            location, cached, ..
        } = h.service.compile(SOURCE).await.unwrap()
        else {
            panic!("expected a compiled artifact");
        };
        assert!(cached);
        assert_eq!(location, h.service.artifacts().location_for(&hash));
        assert!(h.service.artifacts().read(&hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failure_reports_parsed_errors_and_stores_nothing() {
        let h = harness(StubBehaviour::FailWithLog(
            "! LaTeX Error: File `missing.sty' not found.\nType X to quit\n",
        ))
        .await;

        let outcome = h.service.compile(SOURCE).await.unwrap();

        let CompileOutcome::Failed { errors, logs, .. } = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(
            errors,
            vec!["! LaTeX Error: File `missing.sty' not found.", "Type X to quit"]
        );
        assert!(logs.contains("missing.sty"));
        assert!(h.store.cached_pdf(&content_hash(SOURCE)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_failure_outcome() {
        let h = harness(StubBehaviour::TimeOut).await;
        let outcome = h.service.compile(SOURCE).await.unwrap();
        let CompileOutcome::Failed { errors, .. } = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_working_directory_removed_on_success_and_failure() {
        for behaviour in [
            StubBehaviour::Succeed,
            StubBehaviour::FailWithLog("! boom\nl.1"),
            StubBehaviour::TimeOut,
        ] {
            let h = harness(behaviour).await;
            h.service.compile(SOURCE).await.unwrap();
            let dirs = h.compiler.work_dirs();
            assert_eq!(dirs.len(), 1);
            assert!(!dirs[0].exists());
        }
    }

    #[tokio::test]
    async fn test_compile_variant_stamps_last_compiled_hash() {
        let h = harness(StubBehaviour::Succeed).await;
        h.store
            .save_resume(&sample_resume(VariantKey::AiMl))
            .await
            .unwrap();
        let template = LatexTemplate::embedded().unwrap();

        let outcome = h
            .service
            .compile_variant(&template, VariantKey::AiMl)
            .await
            .unwrap();

        let resume = h.store.get_resume(VariantKey::AiMl).await.unwrap().unwrap();
        assert_eq!(resume.metadata.last_compiled_hash.as_deref(), Some(outcome.hash()));
    }

    #[tokio::test]
    async fn test_identical_documents_share_a_hash() {
        let h = harness(StubBehaviour::Succeed).await;
        let template = LatexTemplate::embedded().unwrap();
        for variant in [VariantKey::AiMl, VariantKey::FullStack] {
            let mut resume = sample_resume(VariantKey::AiMl);
            resume.variant_key = variant;
            h.store.save_resume(&resume).await.unwrap();
        }

        let first = h.service.compile_variant(&template, VariantKey::AiMl).await.unwrap();
        let second = h
            .service
            .compile_variant(&template, VariantKey::FullStack)
            .await
            .unwrap();

        assert_eq!(first.hash(), second.hash());
        assert!(matches!(second, CompileOutcome::Compiled { cached: true, .. }));
    }

    #[tokio::test]
    async fn test_failed_compile_leaves_hash_unset() {
        let h = harness(StubBehaviour::FailWithLog("! Missing $ inserted.\nl.3")).await;
        h.store
            .save_resume(&sample_resume(VariantKey::AiMl))
            .await
            .unwrap();
        let template = LatexTemplate::embedded().unwrap();

        let outcome = h
            .service
            .compile_variant(&template, VariantKey::AiMl)
            .await
            .unwrap();

        assert!(matches!(outcome, CompileOutcome::Failed { .. }));
        let resume = h.store.get_resume(VariantKey::AiMl).await.unwrap().unwrap();
        assert!(resume.metadata.last_compiled_hash.is_none());
    }

    #[tokio::test]
    async fn test_compile_variant_without_document_is_not_found() {
        let h = harness(StubBehaviour::Succeed).await;
        let template = LatexTemplate::embedded().unwrap();
        let err = h
            .service
            .compile_variant(&template, VariantKey::BackendCloud)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(h.compiler.runs(), 0);
    }

    #[test]
    fn test_removing_vanished_work_dir_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::remove_dir_all(dir.path()).unwrap();
        remove_work_dir(dir);
    }
}
