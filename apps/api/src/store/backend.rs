use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::store::id::ArtifactId;

/// Where artifact bytes physically live. The `ArtifactStore` owns metadata
/// and expiry; backends only hold bytes.
///
/// `write` must be all-or-nothing: a concurrent `read` sees either no object
/// or the complete bytes. `remove` must be idempotent.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn write(&self, id: &ArtifactId, bytes: Bytes) -> Result<()>;

    async fn read(&self, id: &ArtifactId) -> Result<Option<Bytes>>;

    async fn remove(&self, id: &ArtifactId) -> Result<()>;
}

/// Keeps bytes in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: DashMap<ArtifactId, Bytes>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, id: &ArtifactId, bytes: Bytes) -> Result<()> {
        self.objects.insert(id.clone(), bytes);
        Ok(())
    }

    async fn read(&self, id: &ArtifactId) -> Result<Option<Bytes>> {
        Ok(self.objects.get(id).map(|b| b.value().clone()))
    }

    async fn remove(&self, id: &ArtifactId) -> Result<()> {
        self.objects.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_remove_is_idempotent() {
        let backend = MemoryBackend::new();
        let id = ArtifactId::generate();
        backend.write(&id, Bytes::from_static(b"pdf")).await.unwrap();
        assert_eq!(
            backend.read(&id).await.unwrap(),
            Some(Bytes::from_static(b"pdf"))
        );

        backend.remove(&id).await.unwrap();
        backend.remove(&id).await.unwrap();
        assert_eq!(backend.read(&id).await.unwrap(), None);
    }
}
