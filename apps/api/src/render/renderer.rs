//! Document Renderer: MarkupTree + PageOptions → verified PDF bytes.
//!
//! # Session lifecycle
//! 1. Wait (bounded) for one of `max_concurrency` render slots.
//! 2. Launch a dedicated engine instance and wrap it in a `SessionGuard`.
//! 3. Open a page, load the HTML, block on the quiescence barrier (bounded).
//! 4. Print, then release the engine, on every path, before inspecting the result.
//!
//! No stage is retried here. Retrying is the caller's decision.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::compose::MarkupTree;
use crate::render::engine::{EngineLauncher, EngineSession, LiveSessions, SessionGuard};
use crate::render::error::RenderError;
use crate::render::inspect::{summarize, PdfSummary};
use crate::render::options::PageOptions;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Maximum engine instances alive at once.
    pub max_concurrency: usize,
    /// How long a request may wait for a free slot before it is rejected.
    pub queue_timeout: Duration,
    /// Bound on content load plus the quiescence barrier.
    pub quiescence_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 2,
            queue_timeout: Duration::from_secs(30),
            quiescence_timeout: Duration::from_secs(30),
        }
    }
}

/// A successfully printed and verified document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Bytes,
    pub summary: PdfSummary,
}

pub struct DocumentRenderer {
    launcher: Arc<dyn EngineLauncher>,
    slots: Arc<Semaphore>,
    live: LiveSessions,
    config: RendererConfig,
}

impl DocumentRenderer {
    pub fn new(launcher: Arc<dyn EngineLauncher>, config: RendererConfig) -> Self {
        Self {
            launcher,
            slots: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            live: LiveSessions::default(),
            config,
        }
    }

    /// Engine instances currently alive under this renderer.
    pub fn live_sessions(&self) -> usize {
        self.live.get()
    }

    pub async fn render(
        &self,
        tree: &MarkupTree,
        options: &PageOptions,
    ) -> Result<RenderedDocument, RenderError> {
        let permit = tokio::time::timeout(
            self.config.queue_timeout,
            self.slots.clone().acquire_owned(),
        )
        .await
        .map_err(|_| RenderError::Saturated(self.config.queue_timeout))?
        .map_err(|_| RenderError::EngineUnavailable("renderer is shutting down".to_string()))?;

        let html = tree.to_html();

        let session = self.launcher.launch().await.map_err(|e| {
            warn!("Engine failed to start: {e:#}");
            RenderError::EngineUnavailable(format!("{e:#}"))
        })?;
        let mut guard = SessionGuard::new(session, self.live.clone(), permit);

        let printed = run_session(
            guard.session(),
            &html,
            options,
            self.config.quiescence_timeout,
        )
        .await;
        guard.release().await;
        let bytes = printed?;

        let summary = summarize(&bytes).map_err(|e| RenderError::RenderFailed(format!("{e:#}")))?;
        if !summary.matches(options.page_size) {
            return Err(RenderError::RenderFailed(format!(
                "printed page size {:?}pt does not match {:?}",
                summary.page_points, options.page_size
            )));
        }

        info!(
            "Rendered {} bytes, {} page(s), {:?}",
            bytes.len(),
            summary.page_count,
            options.page_size
        );
        Ok(RenderedDocument {
            bytes: Bytes::from(bytes),
            summary,
        })
    }
}

/// Drives one session from blank engine to printed bytes. Never closes the
/// session; that belongs to the guard.
async fn run_session(
    session: &mut dyn EngineSession,
    html: &str,
    options: &PageOptions,
    quiescence_timeout: Duration,
) -> Result<Vec<u8>, RenderError> {
    session
        .open_page()
        .await
        .map_err(|e| RenderError::EngineUnavailable(format!("{e:#}")))?;

    let loaded = tokio::time::timeout(quiescence_timeout, async {
        session.set_content(html).await?;
        session.wait_for_quiescence().await
    })
    .await
    .map_err(|_| RenderError::Timeout(quiescence_timeout))?;
    loaded.map_err(|e| RenderError::RenderFailed(format!("{e:#}")))?;
    debug!("Content settled; printing");

    let bytes = session
        .print_pdf(options)
        .await
        .map_err(|e| RenderError::RenderFailed(format!("{e:#}")))?;
    if bytes.is_empty() {
        return Err(RenderError::RenderFailed("engine returned no bytes".to_string()));
    }
    Ok(bytes)
}
