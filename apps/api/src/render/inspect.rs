//! Post-print verification of the PDF the engine produced.

use anyhow::{anyhow, Context, Result};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

use crate::render::options::PageSize;

/// Allowed deviation between the requested and the printed page size.
/// Engines round paper sizes to whole device pixels.
const SIZE_TOLERANCE_PT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfSummary {
    pub page_count: usize,
    /// First page's MediaBox size in points, `(width, height)`.
    pub page_points: (f32, f32),
}

impl PdfSummary {
    pub fn matches(&self, size: PageSize) -> bool {
        let (w, h) = size.points();
        (self.page_points.0 - w as f32).abs() <= SIZE_TOLERANCE_PT
            && (self.page_points.1 - h as f32).abs() <= SIZE_TOLERANCE_PT
    }
}

/// Parses `bytes` as a PDF and reports its page count and first-page size.
pub fn summarize(bytes: &[u8]) -> Result<PdfSummary> {
    let doc = Document::load_mem(bytes).context("Output is not a readable PDF")?;
    let pages = doc.get_pages();
    let first = *pages
        .values()
        .next()
        .ok_or_else(|| anyhow!("PDF has no pages"))?;
    let page_points = media_box(&doc, first)?;
    Ok(PdfSummary {
        page_count: pages.len(),
        page_points,
    })
}

/// Looks up the MediaBox on the page, falling back to inherited values on
/// ancestor page-tree nodes.
fn media_box(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let mut node = doc.get_dictionary(page_id)?;
    loop {
        if let Ok(Object::Array(values)) = node.get(b"MediaBox") {
            let nums: Vec<f32> = values
                .iter()
                .map(|v| v.as_float())
                .collect::<std::result::Result<_, _>>()
                .context("MediaBox holds a non-numeric entry")?;
            if nums.len() != 4 {
                return Err(anyhow!("MediaBox must have four entries"));
            }
            return Ok(((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()));
        }
        let parent = node
            .get(b"Parent")
            .and_then(Object::as_reference)
            .map_err(|_| anyhow!("Page has no MediaBox"))?;
        node = doc.get_dictionary(parent)?;
    }
}
