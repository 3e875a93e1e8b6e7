//! Audio-callback-side input tap.

use crate::SampleRing;
use atomic_float::AtomicF32;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The callable the audio layer invokes with each captured block.
///
/// Forwards the block into the [`SampleRing`] and keeps an informational
/// level reading (per-block RMS) in a lock-free cell. Safe to call from a
/// hard real-time context: no locks, no allocation, no I/O.
pub struct InputTap {
    ring: Arc<SampleRing>,
    level: AtomicF32,
    dropped_blocks: AtomicUsize,
}

impl InputTap {
    pub fn new(ring: Arc<SampleRing>) -> Self {
        Self {
            ring,
            level: AtomicF32::new(0.0),
            dropped_blocks: AtomicUsize::new(0),
        }
    }

    /// Forward one captured block of mono samples.
    ///
    /// On backpressure (ring full) the block is dropped silently; the drop
    /// is tallied but never reported from this path.
    pub fn process(&self, block: &[f32]) {
        if block.is_empty() {
            return;
        }

        let sum_sq: f32 = block.iter().map(|s| s * s).sum();
        let rms = (sum_sq / block.len() as f32).sqrt();
        self.level.store(rms, Ordering::Release);

        if !self.ring.write(block) {
            self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// RMS of the most recently captured block.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level.load(Ordering::Acquire)
    }

    /// Blocks dropped to backpressure since construction.
    #[inline]
    pub fn dropped_blocks(&self) -> usize {
        self.dropped_blocks.load(Ordering::Relaxed)
    }

    /// The ring this tap feeds.
    pub fn ring(&self) -> &Arc<SampleRing> {
        &self.ring
    }
}
