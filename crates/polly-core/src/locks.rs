use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One exclusive lock per poll id. Writers on the same poll queue up, writers
/// on different polls never contend.
///
/// Entries are never evicted; polls are never deleted either, so the table is
/// bounded by the number of polls that have seen a write.
#[derive(Default)]
pub struct PollLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PollLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, poll_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            // Only map lookups happen under this guard, so a poisoned table is still consistent.
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(poll_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
