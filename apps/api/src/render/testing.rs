//! In-process fake engine for tests: produces real PDF bytes with `lopdf` and
//! can be told to fail at any stage while counting its live instances.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lopdf::{dictionary, Document, Object};

use crate::render::engine::{EngineLauncher, EngineSession};
use crate::render::options::{PageOptions, PageSize};

/// Builds a blank PDF with `pages` pages of the given size.
pub fn build_pdf(pages: usize, size: PageSize) -> Vec<u8> {
    let (w, h) = size.points();
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), Object::Real(w as f32), Object::Real(h as f32)],
            });
            Object::Reference(page_id)
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("in-memory PDF save");
    buffer
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeBehavior {
    Succeed,
    FailLaunch,
    /// Content never settles; exercises the quiescence timeout.
    NeverQuiesce,
    FailPrint,
    /// Prints Letter regardless of the requested size.
    WrongPageSize,
}

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    launches: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeLauncher {
    behavior: FakeBehavior,
    counters: Arc<Counters>,
}

impl FakeLauncher {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            counters: Arc::default(),
        }
    }

    /// Engine instances started and not yet closed.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live instances observed.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn EngineSession>> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.behavior == FakeBehavior::FailLaunch {
            return Err(anyhow!("simulated launch failure"));
        }
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(live, Ordering::SeqCst);
        // Stay alive briefly so concurrent renders overlap.
        tokio::task::yield_now().await;
        Ok(Box::new(FakeSession {
            behavior: self.behavior,
            counters: self.counters.clone(),
            content: None,
            closed: false,
        }))
    }
}

struct FakeSession {
    behavior: FakeBehavior,
    counters: Arc<Counters>,
    content: Option<String>,
    closed: bool,
}

#[async_trait]
impl EngineSession for FakeSession {
    async fn open_page(&mut self) -> Result<()> {
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<()> {
        self.content = Some(html.to_string());
        Ok(())
    }

    async fn wait_for_quiescence(&mut self) -> Result<()> {
        if self.behavior == FakeBehavior::NeverQuiesce {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn print_pdf(&mut self, options: &PageOptions) -> Result<Vec<u8>> {
        match self.behavior {
            FakeBehavior::FailPrint => Err(anyhow!("simulated print failure")),
            FakeBehavior::WrongPageSize => Ok(build_pdf(1, PageSize::Letter)),
            _ if self.content.is_none() => Err(anyhow!("print before content")),
            _ => Ok(build_pdf(1, options.page_size)),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
