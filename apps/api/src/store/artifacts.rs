//! Artifact Store: transient, unguessably-named documents with a fixed lease.
//!
//! # Lifecycle
//! `put` registers an absolute deadline of `now + ttl` with the lease queue,
//! writes bytes to the backend, then indexes the artifact. The deadline is set
//! once and never extended by reads. A background reaper pops due leases and
//! deletes their artifacts, retrying backend removals that fail; `get` also
//! checks the deadline itself, so an artifact is unreachable from the instant
//! it expires even if the reaper has not run yet.
//!
//! # Consistency
//! The index entry is the linearization point for every id: it is inserted
//! only after the backend write completed and removed before the backend
//! delete starts. A `get` racing a delete therefore sees either the whole
//! artifact or `NotFound`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::store::backend::StorageBackend;
use crate::store::id::{default_id_generator, ArtifactId, IdGenerator};
use crate::store::lease::LeaseQueue;
use crate::store::StoreError;

/// Collisions are astronomically unlikely with random ids; a custom generator
/// that keeps colliding is a bug, not something to loop on forever.
const MAX_ID_ATTEMPTS: usize = 4;

/// Backend removals that fail are retried through the lease queue with a
/// linearly growing delay, then abandoned.
const REMOVE_RETRY_DELAY: Duration = Duration::from_secs(5);
const MAX_REMOVE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct StoreConfig {
    pub ttl: Duration,
    pub id_generator: IdGenerator,
}

impl StoreConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            id_generator: default_id_generator(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactState {
    /// Stored and not downloaded yet.
    Active,
    /// Downloaded at least once; still served until the lease ends.
    Consumed,
}

/// Returned to the caller of `put`; the only way to learn an artifact's id.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactHandle {
    pub id: ArtifactId,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub id: ArtifactId,
    pub file_name: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub state: ArtifactState,
}

#[derive(Debug, Clone)]
struct Entry {
    meta: ArtifactMeta,
    deadline: Instant,
}

/// A downloaded artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Bytes,
}

pub struct ArtifactStore {
    index: DashMap<ArtifactId, Entry>,
    backend: Arc<dyn StorageBackend>,
    leases: Arc<LeaseQueue>,
    /// Ids whose backend removal failed, with the attempt count.
    failed_removals: DashMap<ArtifactId, u32>,
    config: StoreConfig,
}

impl ArtifactStore {
    /// Builds the store and spawns its reaper. The reaper holds only a weak
    /// reference and stops once the store is dropped.
    pub fn start(config: StoreConfig, backend: Arc<dyn StorageBackend>) -> Arc<Self> {
        let store = Arc::new(Self {
            index: DashMap::new(),
            backend,
            leases: Arc::new(LeaseQueue::new()),
            failed_removals: DashMap::new(),
            config,
        });
        spawn_reaper(Arc::downgrade(&store), store.leases.clone());
        info!(
            "Artifact store started: backend={}, ttl={}s",
            store.backend.name(),
            store.config.ttl.as_secs()
        );
        store
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Number of artifacts currently indexed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn fresh_id(&self) -> Result<ArtifactId, StoreError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.config.id_generator)();
            if !self.index.contains_key(&id) {
                return Ok(id);
            }
            warn!("Artifact id collision; drawing another");
        }
        Err(StoreError::WriteFailed(
            "could not allocate a unique artifact id".to_string(),
        ))
    }

    /// Persists `bytes` and arms its expiry. Nothing is indexed if the backend
    /// write fails or the put is cancelled mid-write.
    ///
    /// The lease is armed before the write starts, so bytes a failed or
    /// cancelled write may still leave behind are reclaimed at the deadline
    /// like any other artifact.
    pub async fn put(&self, bytes: Bytes, file_name: String) -> Result<ArtifactHandle, StoreError> {
        let id = self.fresh_id()?;
        let size = bytes.len();

        let ttl = self.config.ttl;
        let deadline = Instant::now() + ttl;
        let created_at = Utc::now();
        self.leases.push(deadline, id.clone());

        self.backend
            .write(&id, bytes)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{e:#}")))?;

        let expires_at = created_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

        self.index.insert(
            id.clone(),
            Entry {
                meta: ArtifactMeta {
                    id: id.clone(),
                    file_name: file_name.clone(),
                    size,
                    created_at,
                    expires_at,
                    state: ArtifactState::Active,
                },
                deadline,
            },
        );
        debug!("Stored artifact {id} ({size} bytes)");

        Ok(ArtifactHandle {
            id,
            file_name,
            created_at,
            expires_at,
            ttl,
        })
    }

    /// Returns the artifact if it exists and its lease has not ended. Reads
    /// mark it consumed but never move its deadline.
    pub async fn get(&self, id: &ArtifactId) -> Result<Artifact, StoreError> {
        let file_name = {
            let mut entry = self.index.get_mut(id).ok_or(StoreError::NotFound)?;
            if Instant::now() >= entry.deadline {
                return Err(StoreError::NotFound);
            }
            if entry.meta.state == ArtifactState::Active {
                entry.meta.state = ArtifactState::Consumed;
            }
            entry.meta.file_name.clone()
        };

        match self.backend.read(id).await {
            Ok(Some(bytes)) => Ok(Artifact { file_name, bytes }),
            // Deleted between the index check and the read.
            Ok(None) => Err(StoreError::NotFound),
            Err(e) => Err(StoreError::ReadFailed(format!("{e:#}"))),
        }
    }

    /// Metadata snapshot, if the artifact is indexed and not yet expired.
    #[cfg(test)]
    pub fn meta(&self, id: &ArtifactId) -> Option<ArtifactMeta> {
        self.index
            .get(id)
            .filter(|entry| Instant::now() < entry.deadline)
            .map(|entry| entry.meta.clone())
    }

    /// Removes bytes and metadata. Idempotent; safe after expiry already ran.
    /// A failed backend removal is rescheduled on the lease queue.
    pub async fn delete(&self, id: &ArtifactId) {
        let removed = self.index.remove(id);
        match self.backend.remove(id).await {
            Ok(()) => {
                self.failed_removals.remove(id);
                if removed.is_some() {
                    debug!("Deleted artifact {id}");
                }
            }
            Err(e) => self.reschedule_removal(id, e),
        }
    }

    fn reschedule_removal(&self, id: &ArtifactId, cause: anyhow::Error) {
        let attempt = {
            let mut attempts = self.failed_removals.entry(id.clone()).or_insert(0);
            *attempts += 1;
            *attempts
        };
        if attempt >= MAX_REMOVE_ATTEMPTS {
            self.failed_removals.remove(id);
            error!("Giving up on removing artifact {id} after {attempt} attempts: {cause:#}");
            return;
        }
        warn!("Failed to remove artifact {id} (attempt {attempt}), retrying: {cause:#}");
        self.leases
            .push(Instant::now() + REMOVE_RETRY_DELAY * attempt, id.clone());
    }

    async fn expire_due(&self) {
        for id in self.leases.pop_expired(Instant::now()) {
            self.delete(&id).await;
            debug!("Artifact {id} expired");
        }
    }
}

impl Drop for ArtifactStore {
    fn drop(&mut self) {
        self.leases.close();
    }
}

fn spawn_reaper(store: Weak<ArtifactStore>, leases: Arc<LeaseQueue>) {
    tokio::spawn(async move {
        loop {
            if leases.is_closed() {
                break;
            }
            match leases.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {}
                        _ = leases.changed() => continue,
                    }
                }
                None => {
                    leases.changed().await;
                    continue;
                }
            }

            let Some(store) = store.upgrade() else {
                break;
            };
            store.expire_due().await;
        }
        debug!("Artifact reaper stopped");
    });
}
