//! Per-analyzer result publication.
//!
//! The owning analyzer is the slot's sole writer; any number of readers may
//! hold a [`ResultReader`] and load snapshots lock-free. A reader always
//! observes either the previous snapshot or a complete new one; overwritten
//! snapshots are dropped when the last reader releases them.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Writer side of a single-cell publication slot.
pub struct ResultSlot<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T: Default> ResultSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(T::default())),
        }
    }
}

impl<T: Default> Default for ResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultSlot<T> {
    /// Replace the published snapshot.
    #[inline]
    pub fn publish(&self, value: T) {
        self.inner.store(Arc::new(value));
    }

    /// A cheap handle for consumers.
    pub fn reader(&self) -> ResultReader<T> {
        ResultReader {
            inner: self.inner.clone(),
        }
    }
}

/// Reader side of a publication slot.
pub struct ResultReader<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> Clone for ResultReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> ResultReader<T> {
    /// The most recently published snapshot.
    ///
    /// The returned `Arc` stays coherent no matter how long it is held.
    #[inline]
    pub fn latest(&self) -> Arc<T> {
        self.inner.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_read() {
        let slot = ResultSlot::<u32>::new();
        let reader = slot.reader();
        assert_eq!(*reader.latest(), 0);

        slot.publish(7);
        assert_eq!(*reader.latest(), 7);
    }

    #[test]
    fn test_held_snapshot_survives_overwrite() {
        let slot = ResultSlot::<u32>::new();
        let reader = slot.reader();

        slot.publish(1);
        let held = reader.latest();
        slot.publish(2);

        assert_eq!(*held, 1);
        assert_eq!(*reader.latest(), 2);
    }

    #[test]
    fn test_readers_clone_independently() {
        let slot = ResultSlot::<u32>::new();
        let first = slot.reader();
        let second = first.clone();

        slot.publish(42);
        assert_eq!(*first.latest(), 42);
        assert_eq!(*second.latest(), 42);
    }
}
