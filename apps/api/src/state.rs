use std::sync::Arc;

use crate::compile::CompileService;
use crate::llm_client::TextGenerator;
use crate::render::LatexTemplate;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Opened at startup and closed on shutdown.
    pub store: Arc<dyn ResumeStore>,
    pub llm: Arc<dyn TextGenerator>,
    pub compiler: Arc<CompileService>,
    /// Page template, checked for its body placeholder when loaded.
    pub template: Arc<LatexTemplate>,
}
