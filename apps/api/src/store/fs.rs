use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::store::backend::StorageBackend;
use crate::store::id::ArtifactId;

const EXTENSION: &str = "pdf";

/// One file per artifact under a base directory.
///
/// Writes go to a temp file in the same directory and are renamed into place,
/// so readers never observe a partially written artifact.
#[derive(Debug, Clone)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    /// Creates the directory if needed and deletes artifacts left behind by a
    /// previous process; their ids are unknown to the new index and can never
    /// be served again.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create artifact dir {}", dir.display()))?;

        let mut purged = 0usize;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_artifact = path.extension().is_some_and(|e| e == EXTENSION)
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(ArtifactId::parse)
                    .is_some();
            if is_artifact {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => purged += 1,
                    Err(e) => warn!("Failed to purge stale artifact {}: {e}", path.display()),
                }
            }
        }
        if purged > 0 {
            info!("Purged {purged} stale artifact(s) from {}", dir.display());
        }

        Ok(Self { dir })
    }

    fn path_for(&self, id: &ArtifactId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn write(&self, id: &ArtifactId, bytes: Bytes) -> Result<()> {
        let dir = self.dir.clone();
        let target = self.path_for(id);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir).context("Failed to create temp file")?;
            tmp.write_all(&bytes).context("Failed to write artifact")?;
            tmp.as_file().sync_all().context("Failed to sync artifact")?;
            tmp.persist(&target)
                .map_err(|e| e.error)
                .with_context(|| format!("Failed to move artifact into {}", target.display()))?;
            Ok(())
        })
        .await
        .context("Artifact write task panicked")?
    }

    async fn read(&self, id: &ArtifactId) -> Result<Option<Bytes>> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read artifact"),
        }
    }

    async fn remove(&self, id: &ArtifactId) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(tmp.path()).await.unwrap();
        let id = ArtifactId::generate();

        backend
            .write(&id, Bytes::from_static(b"%PDF-1.7 body"))
            .await
            .unwrap();
        assert!(tmp.path().join(format!("{id}.pdf")).exists());
        assert_eq!(
            backend.read(&id).await.unwrap().as_deref(),
            Some(&b"%PDF-1.7 body"[..])
        );

        backend.remove(&id).await.unwrap();
        backend.remove(&id).await.unwrap();
        assert_eq!(backend.read(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(tmp.path()).await.unwrap();
        backend
            .write(&ArtifactId::generate(), Bytes::from_static(b"x"))
            .await
            .unwrap();
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_open_purges_stale_artifacts_only() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join(format!("{}.pdf", ArtifactId::generate()));
        let unrelated = tmp.path().join("notes.txt");
        std::fs::write(&stale, b"old").unwrap();
        std::fs::write(&unrelated, b"keep").unwrap();

        FsBackend::open(tmp.path()).await.unwrap();
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }
}
