// Artifact Store: transient PDFs keyed by unguessable ids, reclaimed by a lease queue.
// Metadata and expiry live here; bytes live in a pluggable backend (memory, fs, s3).

pub mod artifacts;
pub mod backend;
pub mod fs;
pub mod id;
pub mod lease;
pub mod s3;

use thiserror::Error;

pub use artifacts::{ArtifactHandle, ArtifactStore, StoreConfig};
pub use backend::{MemoryBackend, StorageBackend};
pub use fs::FsBackend;
pub use id::ArtifactId;
pub use s3::S3Backend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact write failed: {0}")]
    WriteFailed(String),

    #[error("artifact read failed: {0}")]
    ReadFailed(String),

    #[error("artifact not found")]
    NotFound,
}
