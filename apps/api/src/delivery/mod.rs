// Delivery Endpoint: request validation -> compose -> render -> store -> handle.
// Handlers stay thin; the pipeline owns ordering and failure logging.

pub mod handlers;
pub mod pipeline;

pub use pipeline::{GenerateRequest, ResumePipeline};
