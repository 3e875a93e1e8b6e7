//! Builder for configuring and constructing a `DiagnosticsSession`.

use crate::{
    AnalysisConfig, AnalysisEngine, DiagnosticsSession, Error, FretBuzzAnalyzer, InputTap,
    IntonationAnalyzer, Result, SampleRing, StringHealthAnalyzer,
};
use std::sync::Arc;

/// Defaults match a typical capture setup: 48 kHz, 2048-sample frames, and
/// a ring holding sixteen frames (~0.7 s) of slack for the worker.
///
/// # Example
///
/// ```no_run
/// use fretlab::prelude::*;
///
/// let session = DiagnosticsSession::builder()
///     .sample_rate(44_100.0)
///     .ring_capacity(1 << 16)
///     .build()?;
/// # Ok::<(), fretlab::Error>(())
/// ```
pub struct DiagnosticsSessionBuilder {
    sample_rate: f64,
    frame_size: usize,
    ring_capacity: usize,
}

impl Default for DiagnosticsSessionBuilder {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            frame_size: 2048,
            ring_capacity: 2048 * 16,
        }
    }
}

impl DiagnosticsSessionBuilder {
    /// Default: 48 000 Hz
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Default: 2048. Kept equal to the analyzers' FFT size unless you have
    /// a reason not to.
    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size;
        self
    }

    /// Default: 16 frames. Must hold at least one frame.
    pub fn ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<DiagnosticsSession> {
        let config = AnalysisConfig::new(self.sample_rate, self.frame_size);
        config.validate()?;

        if self.ring_capacity < self.frame_size {
            return Err(Error::InvalidConfig(format!(
                "ring_capacity {} cannot hold one frame of {}",
                self.ring_capacity, self.frame_size
            )));
        }

        let ring = Arc::new(SampleRing::new(self.ring_capacity));
        let engine = AnalysisEngine::new(ring.clone(), config);

        let fret_buzz = FretBuzzAnalyzer::new();
        let fret_buzz_reader = fret_buzz.reader();
        engine.register(Box::new(fret_buzz))?;

        let intonation = IntonationAnalyzer::new();
        let intonation_reader = intonation.reader();
        engine.register(Box::new(intonation))?;

        let string_health = StringHealthAnalyzer::new();
        let string_health_reader = string_health.reader();
        engine.register(Box::new(string_health))?;

        let tap = Arc::new(InputTap::new(ring));

        Ok(DiagnosticsSession::from_parts(
            engine,
            tap,
            fret_buzz_reader,
            intonation_reader,
            string_health_reader,
        ))
    }
}
