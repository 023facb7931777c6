use std::sync::Arc;

use crate::config::Config;
use crate::delivery::ResumePipeline;
use crate::render::DocumentRenderer;
use crate::store::ArtifactStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub renderer: Arc<DocumentRenderer>,
    pub store: Arc<ArtifactStore>,
    pub pipeline: Arc<ResumePipeline>,
}

impl AppState {
    pub fn new(config: Config, renderer: Arc<DocumentRenderer>, store: Arc<ArtifactStore>) -> Self {
        let pipeline = Arc::new(ResumePipeline::new(
            renderer.clone(),
            store.clone(),
            config.page_options(),
        ));
        Self {
            config,
            renderer,
            store,
            pipeline,
        }
    }
}
