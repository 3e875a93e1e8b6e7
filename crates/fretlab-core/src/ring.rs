//! Lock-free single-producer single-consumer ring of audio samples.
//!
//! Bridges the hard real-time capture callback (producer) to the analysis
//! worker (consumer). Both sides are wait-free; the backing storage is
//! allocated once at construction and never again.
//!
//! The producer's release store of `write_idx` paired with the consumer's
//! acquire load is the only cross-thread synchronization: samples copied
//! before the store are visible after the load. The read side mirrors this
//! for space reclamation.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Index on its own cache line so producer and consumer positions don't
/// false-share.
#[repr(align(64))]
struct AlignedIndex(AtomicUsize);

/// Bounded SPSC FIFO of `f32` samples.
///
/// The backing array holds `capacity + 1` slots; one slot always stays
/// empty so `write_idx == read_idx` means empty and a full ring never
/// wraps onto unread data. No separate count is kept.
///
/// # Contract
///
/// At most one thread writes (`write`) and at most one thread reads
/// (`read`) at any time. Sharing the ring more widely than one producer
/// plus one consumer voids every guarantee here.
pub struct SampleRing {
    buffer: UnsafeCell<Box<[f32]>>,
    /// Next slot the producer will fill. Written only by the producer.
    write_idx: AlignedIndex,
    /// Next slot the consumer will drain. Written only by the consumer.
    read_idx: AlignedIndex,
}

// SAFETY: the producer only writes slots outside the readable region and
// publishes them with a release store of `write_idx`; the consumer only
// reads slots inside the readable region it observed via an acquire load.
// With one producer and one consumer the regions never overlap.
unsafe impl Send for SampleRing {}
unsafe impl Sync for SampleRing {}

impl SampleRing {
    /// Allocate a ring holding up to `capacity` samples.
    ///
    /// This is the only allocation the ring ever performs.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SampleRing capacity must be non-zero");
        Self {
            buffer: UnsafeCell::new(vec![0.0; capacity + 1].into_boxed_slice()),
            write_idx: AlignedIndex(AtomicUsize::new(0)),
            read_idx: AlignedIndex(AtomicUsize::new(0)),
        }
    }

    /// Usable capacity in samples (one less than the slot count).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots() - 1
    }

    #[inline]
    fn slots(&self) -> usize {
        // SAFETY: the length of the backing slice is fixed at construction
        // and never mutated, so reading it through the cell is always safe.
        unsafe { (&*self.buffer.get()).len() }
    }

    /// Write all of `data` into the ring, or nothing.
    ///
    /// Returns `false` when fewer than `data.len()` slots are free; the
    /// caller drops the block (backpressure, not an error). An empty slice
    /// is a successful no-op. Never blocks, never allocates.
    pub fn write(&self, data: &[f32]) -> bool {
        if data.is_empty() {
            return true;
        }

        let slots = self.slots();
        let write = self.write_idx.0.load(Ordering::Relaxed);
        let read = self.read_idx.0.load(Ordering::Acquire);
        let readable = (write + slots - read) % slots;
        let writable = slots - 1 - readable;

        if data.len() > writable {
            return false;
        }

        let buf = self.buffer.get();
        for (i, &sample) in data.iter().enumerate() {
            let idx = (write + i) % slots;
            // SAFETY: `idx` walks the writable region only, which the
            // consumer never touches until `write_idx` is published below.
            unsafe { (*buf).as_mut_ptr().add(idx).write(sample) };
        }

        self.write_idx
            .0
            .store((write + data.len()) % slots, Ordering::Release);
        true
    }

    /// Read up to `out.len()` samples in FIFO order.
    ///
    /// Returns the number of samples actually read; fewer than requested is
    /// normal (starvation, not an error). Never blocks, never allocates.
    pub fn read(&self, out: &mut [f32]) -> usize {
        if out.is_empty() {
            return 0;
        }

        let slots = self.slots();
        let write = self.write_idx.0.load(Ordering::Acquire);
        let read = self.read_idx.0.load(Ordering::Relaxed);
        let readable = (write + slots - read) % slots;
        let count = readable.min(out.len());

        let buf = self.buffer.get();
        for (i, slot) in out[..count].iter_mut().enumerate() {
            let idx = (read + i) % slots;
            // SAFETY: `idx` walks the readable region the acquire load of
            // `write_idx` made visible; the producer never rewrites it until
            // `read_idx` is published below.
            *slot = unsafe { *(*buf).as_ptr().add(idx) };
        }

        self.read_idx
            .0
            .store((read + count) % slots, Ordering::Release);
        count
    }

    /// Samples currently readable.
    ///
    /// A lower bound when the producer is writing concurrently.
    #[inline]
    pub fn available_read(&self) -> usize {
        let slots = self.slots();
        let write = self.write_idx.0.load(Ordering::Acquire);
        let read = self.read_idx.0.load(Ordering::Relaxed);
        (write + slots - read) % slots
    }

    /// Slots currently free for writing.
    ///
    /// A lower bound when the consumer is reading concurrently.
    #[inline]
    pub fn available_write(&self) -> usize {
        let slots = self.slots();
        let write = self.write_idx.0.load(Ordering::Relaxed);
        let read = self.read_idx.0.load(Ordering::Acquire);
        let readable = (write + slots - read) % slots;
        slots - 1 - readable
    }
}
