mod compile;
mod config;
mod db;
mod editing;
mod errors;
mod llm_client;
mod models;
mod patch;
mod render;
mod resume;
mod routes;
mod seed;
mod state;
mod store;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::compile::{
    ArtifactStore, CompileService, LocalArtifactStore, PdfLatex, S3ArtifactStore,
};
use crate::config::{ArtifactBackend, Config, S3Settings};
use crate::llm_client::LlmClient;
use crate::render::LatexTemplate;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ResumeStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumePilot API v{}", env!("CARGO_PKG_VERSION"));

    // Open the document store
    let store: Arc<dyn ResumeStore> = Arc::new(SqliteStore::connect(&config.database_url).await?);

    if let Some(dir) = &config.seed_dir {
        let inserted = seed::seed_from_dir(store.as_ref(), dir).await?;
        info!("Seeded {inserted} document(s) from {}", dir.display());
    }

    // Page template (checked for its body placeholder here, not per request)
    let template = LatexTemplate::load(config.template_path.as_deref())
        .context("Failed to load LaTeX template")?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    if config.anthropic_api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; AI editing requests will fail");
    }
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Artifact storage and compiler
    let artifacts: Arc<dyn ArtifactStore> = match &config.artifacts {
        ArtifactBackend::Local { dir } => {
            info!("Storing PDFs in {}", dir.display());
            Arc::new(LocalArtifactStore::new(dir.clone()))
        }
        ArtifactBackend::S3(settings) => {
            let client = build_s3_client(settings).await;
            info!("Storing PDFs in S3 bucket {}", settings.bucket);
            Arc::new(S3ArtifactStore::new(client, settings.bucket.clone()))
        }
    };
    let compiler = CompileService::new(
        store.clone(),
        artifacts,
        Arc::new(PdfLatex::new(&config.latex_command, config.compile_timeout)),
        config.compile_work_dir.clone(),
    );
    info!(
        "Compiler: {} (timeout {:?})",
        config.latex_command, config.compile_timeout
    );

    // Build app state
    let state = AppState {
        store: store.clone(),
        llm: Arc::new(llm),
        compiler: Arc::new(compiler),
        template: Arc::new(template),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Constructs an S3 client for MinIO (custom endpoint) or AWS.
/// Static credentials are used when both keys are configured; otherwise the
/// default provider chain applies.
async fn build_s3_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"));

    if let (Some(key_id), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "resumepilot-static",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = &settings.endpoint {
        // MinIO serves buckets under the path, not a subdomain.
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}
