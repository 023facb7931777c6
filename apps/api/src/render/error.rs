use std::time::Duration;

use thiserror::Error;

/// Failures of a single render request. None of them is retried inside the
/// renderer; every variant is returned only after the engine instance has
/// been released.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("page did not reach quiescence within {0:?}")]
    Timeout(Duration),

    #[error("render failed: {0}")]
    RenderFailed(String),

    /// Every render slot stayed busy for the whole queue wait.
    #[error("all render slots busy after waiting {0:?}")]
    Saturated(Duration),
}

impl RenderError {
    /// Short stage tag used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::EngineUnavailable(_) => "engine_start",
            RenderError::Timeout(_) => "quiescence",
            RenderError::RenderFailed(_) => "print",
            RenderError::Saturated(_) => "queue",
        }
    }
}
