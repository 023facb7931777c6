use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::compose::compose;
use crate::errors::AppError;
use crate::models::ProfileData;
use crate::render::{DocumentRenderer, PageOptions};
use crate::store::{ArtifactHandle, ArtifactStore};

/// Body of `POST /api/resume/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub profile_data: Option<ProfileData>,
    /// Proof of payment. Verified upstream; here it only has to be present.
    #[serde(default, alias = "paymentId")]
    pub payment_token: Option<String>,
    /// Logged only. Never used for ids or file names.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedResume {
    pub handle: ArtifactHandle,
    pub page_count: usize,
}

/// Runs one generate request end to end: validate, compose, render, store.
///
/// Nothing is stored unless rendering succeeded, and the render slot is
/// released before the store write starts. A request that is dropped
/// mid-render stores nothing, so every stored artifact has a handle that
/// reached the caller.
pub struct ResumePipeline {
    renderer: Arc<DocumentRenderer>,
    store: Arc<ArtifactStore>,
    page_options: PageOptions,
}

impl ResumePipeline {
    pub fn new(
        renderer: Arc<DocumentRenderer>,
        store: Arc<ArtifactStore>,
        page_options: PageOptions,
    ) -> Self {
        Self {
            renderer,
            store,
            page_options,
        }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GeneratedResume, AppError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate_resume",
            %request_id,
            user_id = request.user_id.as_deref().unwrap_or("-"),
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: GenerateRequest) -> Result<GeneratedResume, AppError> {
        let profile = validate_request(request).map_err(|e| {
            warn!(stage = "validate", "Rejected request: {e}");
            e
        })?;

        let tree = compose(&profile);
        debug!(stage = "compose", sections = tree.sections.len(), "Composed resume");

        let document = self
            .renderer
            .render(&tree, &self.page_options)
            .await
            .map_err(|e| {
                error!(stage = "render", step = e.stage(), "Render failed: {e}");
                AppError::from(e)
            })?;

        let handle = self
            .store
            .put(document.bytes, artifact_file_name(&profile))
            .await
            .map_err(|e| {
                error!(stage = "store", "Store failed: {e}");
                AppError::from(e)
            })?;

        info!(
            "Resume generated: artifact={}, pages={}, expires_at={}",
            handle.id,
            document.summary.page_count,
            handle.expires_at.to_rfc3339()
        );
        Ok(GeneratedResume {
            handle,
            page_count: document.summary.page_count,
        })
    }
}

/// Payment first, then the profile, so an unpaid request never costs a render.
fn validate_request(request: GenerateRequest) -> Result<ProfileData, AppError> {
    let paid = request
        .payment_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !paid {
        return Err(AppError::PaymentRequired);
    }

    let profile = request
        .profile_data
        .ok_or_else(|| AppError::Validation("Profile data is required".to_string()))?;

    profile.validate().map_err(|missing| {
        AppError::Validation(format!(
            "Missing required profile fields: {}",
            missing.join(", ")
        ))
    })?;

    Ok(profile)
}

/// `resume_<first>_<last>.pdf`, restricted to `[A-Za-z0-9_-]` so it is safe
/// inside a Content-Disposition header.
pub fn artifact_file_name(profile: &ProfileData) -> String {
    format!(
        "resume_{}_{}.pdf",
        sanitize(profile.first_name().unwrap_or_default()),
        sanitize(profile.last_name().unwrap_or_default())
    )
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
