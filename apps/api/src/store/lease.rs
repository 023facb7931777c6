//! Timed leases: one min-heap of absolute deadlines instead of a timer per artifact.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::store::id::ArtifactId;

#[derive(Debug, Default)]
pub struct LeaseQueue {
    heap: Mutex<BinaryHeap<Reverse<(Instant, ArtifactId)>>>,
    wake: Notify,
    closed: AtomicBool,
}

impl LeaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `id` to expire at `deadline`. Wakes the reaper if this lease
    /// is now the earliest.
    pub fn push(&self, deadline: Instant, id: ArtifactId) {
        let earliest = {
            let mut heap = self.heap.lock().unwrap_or_else(|e| e.into_inner());
            let earliest = heap.peek().map_or(true, |Reverse((d, _))| deadline < *d);
            heap.push(Reverse((deadline, id)));
            earliest
        };
        if earliest {
            self.wake.notify_one();
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let heap = self.heap.lock().unwrap_or_else(|e| e.into_inner());
        heap.peek().map(|Reverse((d, _))| *d)
    }

    /// Removes and returns every lease whose deadline is at or before `now`,
    /// earliest first.
    pub fn pop_expired(&self, now: Instant) -> Vec<ArtifactId> {
        let mut heap = self.heap.lock().unwrap_or_else(|e| e.into_inner());
        let mut expired = Vec::new();
        while let Some(Reverse((deadline, _))) = heap.peek() {
            if *deadline > now {
                break;
            }
            if let Some(Reverse((_, id))) = heap.pop() {
                expired.push(id);
            }
        }
        expired
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Resolves when a new earliest lease arrives or the queue is closed.
    pub async fn changed(&self) {
        self.wake.notified().await;
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pop_expired_returns_due_leases_in_order() {
        let queue = LeaseQueue::new();
        let now = Instant::now();
        let a = ArtifactId::generate();
        let b = ArtifactId::generate();
        let c = ArtifactId::generate();
        queue.push(now + Duration::from_secs(30), b.clone());
        queue.push(now + Duration::from_secs(10), a.clone());
        queue.push(now + Duration::from_secs(90), c.clone());

        assert_eq!(queue.next_deadline(), Some(now + Duration::from_secs(10)));
        assert!(queue.pop_expired(now).is_empty());
        assert_eq!(queue.pop_expired(now + Duration::from_secs(30)), vec![a, b]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_expired(now + Duration::from_secs(90)), vec![c]);
        assert_eq!(queue.next_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_push_wakes_waiter() {
        let queue = LeaseQueue::new();
        queue.push(Instant::now() + Duration::from_secs(60), ArtifactId::generate());
        // The first push stored a wake permit; consume it.
        queue.changed().await;

        queue.push(Instant::now() + Duration::from_secs(5), ArtifactId::generate());
        tokio::time::timeout(Duration::from_millis(1), queue.changed())
            .await
            .expect("earlier lease should wake the reaper");
    }
}
