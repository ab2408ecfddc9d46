//! Per-key async locks.
//!
//! Used wherever two concurrent callers must not both do the same work for
//! the same key: artifact computation per cache key, uploads per checksum.
//! Shared holders of a key run alongside each other and exclude an
//! exclusive holder, which is how artifact writes for one file are kept
//! out of that file's purge.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

type LockMap = HashMap<String, Arc<RwLock<()>>>;

/// A set of named async read/write locks, created on demand and dropped
/// when idle.
///
/// # Example
///
/// ```
/// use depot_core::KeyedLocks;
///
/// # #[tokio::main]
/// # async fn main() {
/// let locks = KeyedLocks::default();
/// {
///     let _guard = locks.lock("artifact-key").await;
///     assert_eq!(locks.len(), 1);
/// }
/// assert!(locks.is_empty());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl KeyedLocks {
    /// Wait for exclusive ownership of `key`.
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let held = Held::Exclusive(self.entry(key).write_owned().await);
        self.guard(key, held)
    }

    /// Wait for shared ownership of `key`. Shared holders only exclude
    /// [`KeyedLocks::lock`].
    pub async fn lock_shared(&self, key: &str) -> KeyedGuard {
        let held = Held::Shared(self.entry(key).read_owned().await);
        self.guard(key, held)
    }

    fn entry(&self, key: &str) -> Arc<RwLock<()>> {
        let mut map = lock_map(&self.inner);
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    fn guard(&self, key: &str, held: Held) -> KeyedGuard {
        KeyedGuard {
            key: key.to_string(),
            held: Some(held),
            map: Arc::clone(&self.inner),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        lock_map(&self.inner).len()
    }

    /// True when no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
enum Held {
    Exclusive(OwnedRwLockWriteGuard<()>),
    Shared(OwnedRwLockReadGuard<()>),
}

/// Ownership of one key. Releasing the last guard removes the key.
#[derive(Debug)]
pub struct KeyedGuard {
    key: String,
    held: Option<Held>,
    map: Arc<Mutex<LockMap>>,
}

impl KeyedGuard {
    /// True for a guard from [`KeyedLocks::lock`].
    pub fn is_exclusive(&self) -> bool {
        matches!(self.held, Some(Held::Exclusive(_)))
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        match self.held.take() {
            Some(Held::Exclusive(guard)) => drop(guard),
            Some(Held::Shared(guard)) => drop(guard),
            None => {}
        }
        let mut map = lock_map(&self.map);
        let idle = map
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if idle {
            map.remove(&self.key);
        }
    }
}

fn lock_map(map: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
