//! A store handle that can be shared across threads.
//!
//! The store itself is single-threaded. When a tree must be reachable from
//! several threads (the C surface hands out raw handles, for instance), it
//! is guarded by one read/write lock covering the whole tree.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::OptionStore;

/// Cloneable, thread-safe handle to one [`OptionStore`].
///
/// Readers run concurrently; a writer excludes everyone else. Clones refer
/// to the same tree.
#[derive(Debug, Clone, Default)]
pub struct SharedOptionStore {
    inner: Arc<RwLock<OptionStore>>,
}

impl SharedOptionStore {
    pub fn new(store: OptionStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, OptionStore> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Option store lock was poisoned; continuing with last state");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, OptionStore> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Option store lock was poisoned; continuing with last state");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Runs `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&OptionStore) -> R) -> R {
        f(&*self.read_guard())
    }

    /// Runs `f` with exclusive access to the tree.
    pub fn write<R>(&self, f: impl FnOnce(&mut OptionStore) -> R) -> R {
        f(&mut *self.write_guard())
    }

    /// Swaps in a new tree, returning the old one.
    pub fn replace(&self, store: OptionStore) -> OptionStore {
        std::mem::replace(&mut *self.write_guard(), store)
    }

    /// Copy of the current tree.
    pub fn snapshot(&self) -> OptionStore {
        self.read_guard().clone()
    }
}

impl From<OptionStore> for SharedOptionStore {
    fn from(store: OptionStore) -> Self {
        Self::new(store)
    }
}
