//! Engine seam: the renderer only talks to a headless engine through these traits.
//!
//! `EngineLauncher::launch` starts one engine instance; the returned session owns
//! that instance and the single page opened inside it. `SessionGuard` ties the
//! instance's lifetime to a scope: it is closed on `release`, and on drop if the
//! owning future was abandoned before reaching `release`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, warn};

use crate::render::options::PageOptions;

#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Starts a fresh engine instance. Instances share no state.
    async fn launch(&self) -> Result<Box<dyn EngineSession>>;
}

#[async_trait]
pub trait EngineSession: Send {
    /// Opens the page all later calls operate on.
    async fn open_page(&mut self) -> Result<()>;

    /// Replaces the page document with `html`.
    async fn set_content(&mut self, html: &str) -> Result<()>;

    /// Resolves once the page has no pending loads and has painted.
    async fn wait_for_quiescence(&mut self) -> Result<()>;

    /// Prints the current page to PDF bytes.
    async fn print_pdf(&mut self, options: &PageOptions) -> Result<Vec<u8>>;

    /// Shuts the engine instance down.
    async fn close(&mut self) -> Result<()>;
}

/// Count of engine instances currently alive.
#[derive(Debug, Clone, Default)]
pub struct LiveSessions(Arc<AtomicUsize>);

impl LiveSessions {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn inc(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn dec(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scoped ownership of one live engine session and the render slot it occupies.
pub struct SessionGuard {
    session: Option<Box<dyn EngineSession>>,
    live: LiveSessions,
    permit: Option<OwnedSemaphorePermit>,
}

impl SessionGuard {
    pub fn new(
        session: Box<dyn EngineSession>,
        live: LiveSessions,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        live.inc();
        Self {
            session: Some(session),
            live,
            permit: Some(permit),
        }
    }

    pub fn session(&mut self) -> &mut dyn EngineSession {
        self.session
            .as_deref_mut()
            .expect("engine session is present until release")
    }

    /// Closes the engine instance and frees the render slot.
    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Engine close reported an error: {e:#}");
            }
            self.live.dec();
        }
        self.permit.take();
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let live = self.live.clone();
        let permit = self.permit.take();

        debug!("Render abandoned before release; closing engine in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!("Background engine close failed: {e:#}");
                    }
                    live.dec();
                    drop(permit);
                });
            }
            Err(_) => {
                // No runtime left to drive an async close; dropping the session
                // tears the instance down synchronously.
                drop(session);
                live.dec();
                drop(permit);
            }
        }
    }
}
