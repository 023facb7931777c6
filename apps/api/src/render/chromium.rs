//! Headless Chromium engine driven over the DevTools protocol.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::render::engine::{EngineLauncher, EngineSession};
use crate::render::options::PageOptions;

/// Resolves `true` once the document is fully loaded, web fonts are ready,
/// every image has settled and two animation frames have been painted.
const QUIESCENCE_SCRIPT: &str = r#"(async () => {
  if (document.readyState !== "complete") {
    await new Promise((resolve) => window.addEventListener("load", resolve, { once: true }));
  }
  if (document.fonts && document.fonts.ready) {
    await document.fonts.ready;
  }
  await Promise.all(
    Array.from(document.images)
      .filter((img) => !img.complete)
      .map((img) => new Promise((resolve) => { img.onload = img.onerror = resolve; }))
  );
  await new Promise((resolve) => requestAnimationFrame(() => requestAnimationFrame(resolve)));
  return true;
})()"#;

/// Launches one headless Chromium process per render.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl EngineLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn EngineSession>> {
        // Unique profile directory per instance so concurrent browsers never
        // contend on the same profile lock.
        let user_data_dir = tempfile::Builder::new()
            .prefix("resume-render-")
            .tempdir()
            .context("Failed to create browser profile directory")?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .user_data_dir(user_data_dir.path());
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Headless browser launched");
        Ok(Box::new(ChromiumSession {
            browser,
            handler_task,
            page: None,
            _user_data_dir: user_data_dir,
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    _user_data_dir: TempDir,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("No page open"))
    }
}

fn print_params(options: &PageOptions) -> PrintToPdfParams {
    let (width, height) = options.page_size.inches();
    let (top, right, bottom, left) = options.margins.inches();
    PrintToPdfParams {
        print_background: Some(options.print_background),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(top),
        margin_right: Some(right),
        margin_bottom: Some(bottom),
        margin_left: Some(left),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[async_trait]
impl EngineSession for ChromiumSession {
    async fn open_page(&mut self) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        self.page = Some(page);
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<()> {
        self.page()?
            .set_content(html)
            .await
            .context("Failed to set page content")?;
        Ok(())
    }

    async fn wait_for_quiescence(&mut self) -> Result<()> {
        let params = EvaluateParams::builder()
            .expression(QUIESCENCE_SCRIPT)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| anyhow!("Invalid evaluate params: {e}"))?;
        let settled: bool = self
            .page()?
            .evaluate_expression(params)
            .await
            .context("Quiescence check failed")?
            .into_value()
            .context("Quiescence check returned a non-boolean")?;
        if !settled {
            return Err(anyhow!("Quiescence check reported an unsettled page"));
        }
        debug!("Page reached quiescence");
        Ok(())
    }

    async fn print_pdf(&mut self, options: &PageOptions) -> Result<Vec<u8>> {
        self.page()?
            .pdf(print_params(options))
            .await
            .context("Print to PDF failed")
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        let closed = self.browser.close().await.context("Browser close failed");
        // Reap the child even if the polite close failed.
        if closed.is_err() {
            let _ = self.browser.kill().await;
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        debug!("Headless browser closed");
        closed.map(|_| ())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::options::{Margins, PageSize};

    #[test]
    fn test_print_params_follow_page_options() {
        let options = PageOptions {
            page_size: PageSize::Letter,
            print_background: false,
            margins: Margins::uniform(48.0),
        };
        let params = print_params(&options);
        assert_eq!(params.paper_width, Some(8.5));
        assert_eq!(params.paper_height, Some(11.0));
        assert_eq!(params.print_background, Some(false));
        assert_eq!(params.margin_left, Some(0.5));
    }

    /// Needs a local Chrome/Chromium; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_real_browser_renders_pdf() {
        let launcher = ChromiumLauncher::new(std::env::var_os("CHROME_EXECUTABLE").map(Into::into));
        let mut session = launcher.launch().await.unwrap();
        session.open_page().await.unwrap();
        session
            .set_content("<html><body><h1>Hello</h1></body></html>")
            .await
            .unwrap();
        session.wait_for_quiescence().await.unwrap();
        let bytes = session.print_pdf(&PageOptions::default()).await.unwrap();
        session.close().await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
