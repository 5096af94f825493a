//! Per-group serialisation of read-modify-write operations

use crate::types::GroupKey;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per position group.
///
/// Holding the guard across fetch, compute and persist keeps two writers from
/// planning against the same snapshot. Groups never contend with each other.
/// An entry lives only while some caller holds or waits on its lock.
#[derive(Debug, Default)]
pub struct GroupLocks {
    locks: DashMap<GroupKey, Arc<Mutex<()>>>,
}

/// Exclusive access to one group, released on drop
#[derive(Debug)]
pub struct GroupGuard<'a> {
    locks: &'a GroupLocks,
    key: GroupKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: GroupKey) -> GroupGuard<'_> {
        // Clone the Arc out so the DashMap shard lock is released before awaiting
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        GroupGuard { locks: self, key, guard: Some(guard) }
    }

    /// Number of groups currently locked or awaited
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left means nobody holds or awaits the lock.
        // `entry` in `acquire` takes the same shard lock, so no clone can slip in.
        self.locks.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
