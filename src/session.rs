//! Top-level session that wires the ring, tap, engine, and analyzers.

use crate::{
    AnalysisEngine, FretBuzzResult, InputTap, IntonationResult, ResultReader, StringHealthResult,
};
use std::sync::Arc;

/// One live diagnostics run: a pre-sized ring fed by the audio callback, a
/// worker dispatching frames to the three analyzers, and per-analyzer
/// snapshot readers for the renderer.
///
/// Construct via [`DiagnosticsSession::builder`]. Dropping the session
/// stops the worker.
///
/// # Example
///
/// ```no_run
/// use fretlab::prelude::*;
///
/// let session = DiagnosticsSession::builder().build()?;
/// let tap = session.input_tap();
/// session.start();
///
/// // audio layer: tap.process(block) per captured block
/// // renderer:    session.intonation().latest() at its own rate
/// # Ok::<(), fretlab::Error>(())
/// ```
pub struct DiagnosticsSession {
    engine: AnalysisEngine,
    tap: Arc<InputTap>,
    fret_buzz: ResultReader<FretBuzzResult>,
    intonation: ResultReader<IntonationResult>,
    string_health: ResultReader<StringHealthResult>,
}

impl DiagnosticsSession {
    pub fn builder() -> crate::DiagnosticsSessionBuilder {
        crate::DiagnosticsSessionBuilder::default()
    }

    pub(crate) fn from_parts(
        engine: AnalysisEngine,
        tap: Arc<InputTap>,
        fret_buzz: ResultReader<FretBuzzResult>,
        intonation: ResultReader<IntonationResult>,
        string_health: ResultReader<StringHealthResult>,
    ) -> Self {
        Self {
            engine,
            tap,
            fret_buzz,
            intonation,
            string_health,
        }
    }

    /// The callable to register with the audio layer. Real-time safe.
    pub fn input_tap(&self) -> Arc<InputTap> {
        self.tap.clone()
    }

    /// Spawn the analysis worker. Returns `false` if already running.
    pub fn start(&self) -> bool {
        self.engine.start()
    }

    /// Stop and join the analysis worker. Idempotent.
    pub fn stop(&self) {
        self.engine.stop()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Reset all three analyzers (calibration restarts from `Idle`).
    pub fn reset(&self) {
        self.engine.reset()
    }

    /// Snapshot reader for the fret-buzz analyzer.
    pub fn fret_buzz(&self) -> ResultReader<FretBuzzResult> {
        self.fret_buzz.clone()
    }

    /// Snapshot reader for the intonation analyzer.
    pub fn intonation(&self) -> ResultReader<IntonationResult> {
        self.intonation.clone()
    }

    /// Snapshot reader for the string-health analyzer.
    pub fn string_health(&self) -> ResultReader<StringHealthResult> {
        self.string_health.clone()
    }

    /// RMS of the most recently captured block.
    pub fn input_level(&self) -> f32 {
        self.tap.level()
    }

    /// Captured blocks dropped to ring backpressure.
    pub fn dropped_blocks(&self) -> usize {
        self.tap.dropped_blocks()
    }

    /// Frames dispatched to the analyzers so far.
    pub fn frames_processed(&self) -> u64 {
        self.engine.frames_processed()
    }

    pub fn sample_rate(&self) -> f64 {
        self.engine.config().sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.engine.config().frame_size
    }
}
