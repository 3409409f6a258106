//! Single-writer, multi-reader value cell.
//!
//! The edit thread owns a [`Published`] and replaces its value wholesale.
//! Background readers (media caching, playback) hold a [`PublishedReader`]
//! that shares the same storage. A reader keeps the cell alive after the
//! owning clip has been deleted, and every read observes one complete value.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Owning side of a published value. Only the owner can write.
pub struct Published<T> {
    inner: Arc<RwLock<T>>,
}

/// Read-only handle onto a [`Published`] value.
pub struct PublishedReader<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Published<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Replace the published value.
    pub fn set(&mut self, value: T) {
        *self.inner.write() = value;
    }

    /// Modify the value in place under the write lock.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Hand out a reader sharing this cell.
    pub fn reader(&self) -> PublishedReader<T> {
        PublishedReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of live readers besides the owner.
    pub fn reader_count(&self) -> usize {
        Arc::strong_count(&self.inner) - 1
    }
}

impl<T: Clone> Published<T> {
    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T: Clone> PublishedReader<T> {
    /// Snapshot of the last value the owner published.
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T> PublishedReader<T> {
    /// True once the owning side (and every other reader) has been dropped.
    pub fn is_orphaned(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

impl<T> Clone for PublishedReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Cloning an owner creates an independent cell. Readers of the original
/// never observe writes made through the clone.
impl<T: Clone> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: PartialEq> PartialEq for Published<T> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        *self.inner.read() == *other.inner.read()
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.read(), f)
    }
}

impl<T: Default> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Serialize> Serialize for Published<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.read().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Published<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Published::new)
    }
}
