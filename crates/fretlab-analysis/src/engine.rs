//! The analysis engine: slices the sample ring into frames and drives the
//! registered analyzers from a single worker thread.
//!
//! The worker polls rather than waiting on a condvar: the producer must
//! never block on us, frame times dwarf the poll interval (~42 ms per
//! 2048-sample frame at 48 kHz versus a 1 ms sleep), and the worker is free
//! to allocate and sleep. Backpressure and starvation are both plain return
//! values at the ring.

use crate::Analyzer;
use fretlab_core::{AnalysisConfig, Error, Result, SampleRing};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Worker sleep while the ring holds less than one frame.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the worker lifecycle and the analyzer registration list.
///
/// Frames are delivered to analyzers in the exact order they were written,
/// and within a frame analyzers run in registration order, never
/// concurrently. Dropping the engine stops the worker.
pub struct AnalysisEngine {
    ring: Arc<SampleRing>,
    config: AnalysisConfig,
    analyzers: Arc<Mutex<Vec<Box<dyn Analyzer>>>>,
    running: Arc<AtomicBool>,
    reset_pending: Arc<AtomicBool>,
    frames_processed: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AnalysisEngine {
    pub fn new(ring: Arc<SampleRing>, config: AnalysisConfig) -> Self {
        Self {
            ring,
            config,
            analyzers: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            reset_pending: Arc::new(AtomicBool::new(false)),
            frames_processed: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Configure and append an analyzer.
    ///
    /// Configuration happens immediately, in the caller's context; a
    /// configuration failure leaves the registration list untouched.
    /// Registration is closed while the engine runs.
    pub fn register(&self, mut analyzer: Box<dyn Analyzer>) -> Result<()> {
        if self.is_running() {
            return Err(Error::RegistrationClosed);
        }
        analyzer.configure(&self.config)?;
        self.analyzers.lock().push(analyzer);
        Ok(())
    }

    /// Spawn the worker. Returns `false` (without effect) when already
    /// running.
    pub fn start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let ring = self.ring.clone();
        let analyzers = self.analyzers.clone();
        let running = self.running.clone();
        let reset_pending = self.reset_pending.clone();
        let frames_processed = self.frames_processed.clone();
        let frame_size = self.config.frame_size;

        let handle = std::thread::Builder::new()
            .name("fretlab-analysis".to_string())
            .spawn(move || {
                worker_loop(
                    ring,
                    analyzers,
                    running,
                    reset_pending,
                    frames_processed,
                    frame_size,
                )
            })
            .expect("failed to spawn analysis worker");

        *self.worker.lock() = Some(handle);
        true
    }

    /// Signal the worker to stop and join it. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Reset every registered analyzer.
    ///
    /// While running, the reset is handed to the worker and performed
    /// between frames, so each analyzer's reset stays atomic with respect
    /// to its frame processing; its ordering against in-flight frames is
    /// otherwise unspecified. When stopped, the reset happens immediately.
    pub fn reset(&self) {
        if self.is_running() {
            self.reset_pending.store(true, Ordering::Release);
        } else {
            for analyzer in self.analyzers.lock().iter_mut() {
                analyzer.reset();
            }
        }
    }

    /// Frames dispatched since construction.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    ring: Arc<SampleRing>,
    analyzers: Arc<Mutex<Vec<Box<dyn Analyzer>>>>,
    running: Arc<AtomicBool>,
    reset_pending: Arc<AtomicBool>,
    frames_processed: Arc<AtomicU64>,
    frame_size: usize,
) {
    let mut scratch = vec![0.0f32; frame_size];
    log::debug!("analysis worker started (frame size {frame_size})");

    while running.load(Ordering::Acquire) {
        if reset_pending.swap(false, Ordering::AcqRel) {
            for analyzer in analyzers.lock().iter_mut() {
                analyzer.reset();
            }
        }

        if ring.available_read() < frame_size {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }

        let read = ring.read(&mut scratch);
        debug_assert_eq!(read, frame_size);

        let mut analyzers = analyzers.lock();
        for analyzer in analyzers.iter_mut() {
            if let Err(err) = analyzer.process_frame(&scratch[..read]) {
                log::warn!("analyzer {} skipped a frame: {err}", analyzer.name());
            }
        }
        drop(analyzers);

        frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    log::debug!("analysis worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Records every frame's first sample, tagged with its own id.
    struct RecordingAnalyzer {
        id: usize,
        sink: Arc<Mutex<Vec<(usize, f32)>>>,
        resets: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Analyzer for RecordingAnalyzer {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn configure(&mut self, config: &AnalysisConfig) -> Result<()> {
            config.validate()
        }

        fn process_frame(&mut self, frame: &[f32]) -> Result<()> {
            if self.fail {
                return Err(Error::NotConfigured);
            }
            self.sink.lock().push((self.id, frame[0]));
            Ok(())
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn recording_engine(
        frame_size: usize,
        ids: &[usize],
        fail_mask: &[bool],
    ) -> (
        AnalysisEngine,
        Arc<SampleRing>,
        Arc<Mutex<Vec<(usize, f32)>>>,
        Arc<AtomicUsize>,
    ) {
        let ring = Arc::new(SampleRing::new(frame_size * 16));
        let engine = AnalysisEngine::new(ring.clone(), AnalysisConfig::new(48_000.0, frame_size));
        let sink = Arc::new(Mutex::new(Vec::new()));
        let resets = Arc::new(AtomicUsize::new(0));

        for (&id, &fail) in ids.iter().zip(fail_mask.iter()) {
            engine
                .register(Box::new(RecordingAnalyzer {
                    id,
                    sink: sink.clone(),
                    resets: resets.clone(),
                    fail,
                }))
                .unwrap();
        }
        (engine, ring, sink, resets)
    }

    fn wait_for_frames(engine: &AnalysisEngine, count: u64) {
        for _ in 0..500 {
            if engine.frames_processed() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!(
            "worker processed {} of {count} expected frames",
            engine.frames_processed()
        );
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let (engine, _ring, _sink, _resets) = recording_engine(64, &[0], &[false]);
        assert!(!engine.is_running());

        assert!(engine.start());
        assert!(engine.is_running());
        assert!(!engine.start(), "second start must refuse");

        engine.stop();
        assert!(!engine.is_running());
        engine.stop(); // idempotent
        assert!(!engine.is_running());
    }

    #[test]
    fn test_frames_dispatch_in_order() {
        let (engine, ring, sink, _resets) = recording_engine(4, &[0, 1], &[false, false]);
        engine.start();

        for frame_idx in 0..8 {
            let value = frame_idx as f32;
            while !ring.write(&[value; 4]) {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        wait_for_frames(&engine, 8);
        engine.stop();

        let log = sink.lock();
        assert_eq!(log.len(), 16);
        for (frame_idx, pair) in log.chunks(2).enumerate() {
            // Registration order within the frame, temporal order across.
            assert_eq!(pair[0], (0, frame_idx as f32));
            assert_eq!(pair[1], (1, frame_idx as f32));
        }
    }

    #[test]
    fn test_faulty_analyzer_is_contained() {
        let (engine, ring, sink, _resets) = recording_engine(4, &[0, 1], &[true, false]);
        engine.start();

        ring.write(&[3.0; 4]);
        wait_for_frames(&engine, 1);
        engine.stop();

        // The failing analyzer contributed nothing; the healthy one ran.
        let log = sink.lock();
        assert_eq!(log.as_slice(), &[(1, 3.0)]);
        assert_eq!(engine.frames_processed(), 1);
    }

    #[test]
    fn test_registration_closed_while_running() {
        let (engine, _ring, sink, resets) = recording_engine(4, &[0], &[false]);
        engine.start();

        let rejected = engine.register(Box::new(RecordingAnalyzer {
            id: 9,
            sink: sink.clone(),
            resets: resets.clone(),
            fail: false,
        }));
        assert!(matches!(rejected, Err(Error::RegistrationClosed)));
        engine.stop();
    }

    #[test]
    fn test_reset_reaches_analyzers() {
        let (engine, ring, _sink, resets) = recording_engine(4, &[0], &[false]);

        // Stopped: immediate.
        engine.reset();
        assert_eq!(resets.load(Ordering::Relaxed), 1);

        // Running: honored by the worker within a poll interval.
        engine.start();
        engine.reset();
        ring.write(&[0.0; 4]);
        for _ in 0..500 {
            if resets.load(Ordering::Relaxed) >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        engine.stop();
        assert_eq!(resets.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_restart_after_stop() {
        let (engine, ring, sink, _resets) = recording_engine(4, &[0], &[false]);

        assert!(engine.start());
        ring.write(&[1.0; 4]);
        wait_for_frames(&engine, 1);
        engine.stop();

        assert!(engine.start());
        ring.write(&[2.0; 4]);
        wait_for_frames(&engine, 2);
        engine.stop();

        let log = sink.lock();
        assert_eq!(log.as_slice(), &[(0, 1.0), (0, 2.0)]);
    }
}
