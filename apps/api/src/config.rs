use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::render::{PageOptions, PageSize, RendererConfig};
use crate::store::StoreConfig;

/// Where artifact bytes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Fs,
    S3,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "fs" => Ok(BackendKind::Fs),
            "s3" => Ok(BackendKind::S3),
            other => Err(anyhow!(
                "ARTIFACT_BACKEND must be one of memory, fs, s3 (got '{other}')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup on malformed values, or on missing S3 settings when the
/// S3 backend is selected.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub artifact_ttl: Duration,
    pub backend: BackendKind,
    pub artifact_dir: PathBuf,
    pub s3: Option<S3Settings>,
    pub render_max_concurrency: usize,
    pub render_queue_timeout: Duration,
    pub render_quiescence_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
    pub page_size: PageSize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests never touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = get("ARTIFACT_BACKEND")
            .map(|v| v.parse::<BackendKind>())
            .transpose()?
            .unwrap_or(BackendKind::Memory);

        let s3 = if backend == BackendKind::S3 {
            let require = |key: &str| {
                get(key).with_context(|| {
                    format!("Required environment variable '{key}' is not set (ARTIFACT_BACKEND=s3)")
                })
            };
            Some(S3Settings {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            })
        } else {
            None
        };

        let config = Config {
            port: parse_or(&get, "PORT", 3001)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            artifact_ttl: Duration::from_secs(parse_or(&get, "ARTIFACT_TTL_SECS", 60)?),
            backend,
            artifact_dir: get("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("resume-artifacts")),
            s3,
            render_max_concurrency: parse_or(&get, "RENDER_MAX_CONCURRENCY", 2)?,
            render_queue_timeout: Duration::from_secs(parse_or(
                &get,
                "RENDER_QUEUE_TIMEOUT_SECS",
                30,
            )?),
            render_quiescence_timeout: Duration::from_secs(parse_or(
                &get,
                "RENDER_QUIESCENCE_TIMEOUT_SECS",
                30,
            )?),
            chrome_executable: get("CHROME_EXECUTABLE").map(PathBuf::from),
            page_size: get("RESUME_PAGE_SIZE")
                .map(|v| v.parse::<PageSize>().map_err(|e| anyhow!("RESUME_PAGE_SIZE: {e}")))
                .transpose()?
                .unwrap_or_default(),
        };

        if config.artifact_ttl.is_zero() {
            bail!("ARTIFACT_TTL_SECS must be greater than zero");
        }
        if config.render_max_concurrency == 0 {
            bail!("RENDER_MAX_CONCURRENCY must be greater than zero");
        }
        if config.render_quiescence_timeout.is_zero() {
            bail!("RENDER_QUIESCENCE_TIMEOUT_SECS must be greater than zero");
        }

        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::with_ttl(self.artifact_ttl)
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            max_concurrency: self.render_max_concurrency,
            queue_timeout: self.render_queue_timeout,
            quiescence_timeout: self.render_quiescence_timeout,
        }
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions::with_page_size(self.page_size)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key} must be a valid number: {e}")),
        None => Ok(default),
    }
}
