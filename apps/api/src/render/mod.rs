// Document Renderer: drives a headless engine to turn a MarkupTree into PDF bytes.
// One engine instance per request, capped by a semaphore, released on every path.

pub mod chromium;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod options;
pub mod renderer;
#[cfg(test)]
pub mod testing;

pub use chromium::ChromiumLauncher;
pub use error::RenderError;
pub use options::{PageOptions, PageSize};
pub use renderer::{DocumentRenderer, RendererConfig};
