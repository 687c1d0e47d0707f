use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::*;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of async mutexes addressed by string key.
///
/// Work on one key is serialised while work on different keys proceeds in parallel. Entries are created on demand
/// and removed again once the last holder or waiter goes away. Cloning a `KeyedLocks` shares the underlying set.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Slot>>>,
}

#[derive(Default)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds `key` and returns a guard. The lock is released when the guard is dropped.
    ///
    /// Dropping the returned future before it resolves gives up the wait and leaves no trace of it behind.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard {
        let (registration, mutex) = self.register(key);
        trace!("🔐️ Waiting for lock on {key}");
        let guard = mutex.lock_owned().await;
        trace!("🔐️ Acquired lock on {key}");
        KeyedLockGuard { _guard: guard, _registration: registration }
    }

    /// The number of keys that currently have a holder or waiter.
    pub fn active_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn register(&self, key: &str) -> (Registration, Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let slot = locks.entry(key.to_string()).or_default();
        slot.users += 1;
        (Registration { key: key.to_string(), locks: self.clone() }, slot.mutex.clone())
    }
}

/// One holder or waiter of a key. The key's entry is removed when the last registration drops.
struct Registration {
    key: String,
    locks: KeyedLocks,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut locks = self.locks.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
        trace!("🔐️ Let go of {}", self.key);
    }
}

pub struct KeyedLockGuard {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}
