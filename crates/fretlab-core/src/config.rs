//! Analysis configuration.

use crate::{Error, Result};

/// Immutable parameter bundle passed to every analyzer at registration.
///
/// Analyzers receive a shared reference and must not mutate it. The frame
/// size drives how the engine slices the ring; the analyzers' internal FFT
/// size is fixed independently (2048), so the two should be kept equal in
/// deployment.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Sample rate of the incoming stream in Hz.
    pub sample_rate: f64,
    /// Samples per analysis frame.
    pub frame_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            frame_size: 2048,
        }
    }
}

impl AnalysisConfig {
    pub fn new(sample_rate: f64, frame_size: usize) -> Self {
        Self {
            sample_rate,
            frame_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} must be positive and finite",
                self.sample_rate
            )));
        }
        if self.frame_size == 0 {
            return Err(Error::InvalidConfig(
                "frame_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate
    }
}
