//! String-health rating for a sustained note.
//!
//! Worn strings lose sustain and harmonic integrity. This analyzer tracks
//! the harmonic series of the detected fundamental over a rolling history,
//! fits an exponential decay to the mean harmonic magnitude, and blends the
//! decay rate with spectral brightness and inharmonicity into a single
//! condition score.

use crate::harmonics::{harmonic_deviation, harmonic_magnitudes, HARMONIC_COUNT};
use crate::{Analyzer, ResultReader, ResultSlot, StringHealthResult};
use fretlab_core::{AnalysisConfig, Error, Result};
use fretlab_dsp::{PitchDetector, SpectrumAnalyzer};
use std::collections::VecDeque;
use std::time::Instant;

const FFT_SIZE: usize = 2048;

/// Rolling history depth; oldest entries drop on overflow.
const HISTORY_CAPACITY: usize = 50;
/// History entries required before the decay fit runs.
const MIN_HISTORY_FOR_DECAY: usize = 10;
/// Pitch estimates at or below this confidence are ignored.
const MIN_PITCH_CONFIDENCE: f32 = 0.5;
/// Harmonic peaks are searched within this many bins of the expected bin.
const PEAK_SEARCH_BINS: usize = 3;

/// Useful decay range in dB/s: anything at or past the floor scores 0,
/// anything at or above the ceiling scores 1.
const DECAY_FLOOR_DB_S: f32 = -50.0;
const DECAY_CEIL_DB_S: f32 = -5.0;
/// Nepers/s to dB/s (20 / ln 10).
const NEPERS_TO_DB: f64 = 8.686;

/// Centroid that zeroes the brightness score.
const CENTROID_FULL_SCALE_HZ: f32 = 5000.0;

/// Harmonic means at or below this are excluded from the log fit.
const MEAN_FLOOR: f32 = 1e-6;
/// Regression denominator floor.
const REGRESSION_EPSILON: f64 = 1e-6;

const DECAY_WEIGHT: f32 = 0.3;
const SPECTRAL_WEIGHT: f32 = 0.3;
const INHARMONICITY_WEIGHT: f32 = 0.4;

struct Dsp {
    config: AnalysisConfig,
    spectrum: SpectrumAnalyzer,
    pitch: PitchDetector,
}

/// Rates string condition from harmonic decay, brightness, and
/// inharmonicity.
pub struct StringHealthAnalyzer {
    dsp: Option<Dsp>,
    harmonic_history: VecDeque<[f32; HARMONIC_COUNT]>,
    time_history: VecDeque<f64>,
    /// Audio-clock seconds since configure/reset.
    clock: f64,
    fundamental: f32,
    slot: ResultSlot<StringHealthResult>,
}

impl StringHealthAnalyzer {
    pub fn new() -> Self {
        Self {
            dsp: None,
            harmonic_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            time_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            clock: 0.0,
            fundamental: 0.0,
            slot: ResultSlot::new(),
        }
    }

    /// Consumer handle for published results. Grab this before handing the
    /// analyzer to the engine.
    pub fn reader(&self) -> ResultReader<StringHealthResult> {
        self.slot.reader()
    }

    /// OLS slope of ln(mean harmonic magnitude) against elapsed seconds,
    /// scaled to dB/s. Zero until the history can support a fit.
    fn decay_rate(&self) -> f32 {
        if self.harmonic_history.len() < MIN_HISTORY_FOR_DECAY {
            return 0.0;
        }

        let t0 = *self.time_history.front().expect("history is non-empty");
        let mut xs = Vec::with_capacity(self.harmonic_history.len());
        let mut ys = Vec::with_capacity(self.harmonic_history.len());

        for (harmonics, &t) in self.harmonic_history.iter().zip(self.time_history.iter()) {
            let mean = harmonics.iter().sum::<f32>() / HARMONIC_COUNT as f32;
            if mean <= MEAN_FLOOR {
                continue;
            }
            xs.push(t - t0);
            ys.push((mean as f64).ln());
        }

        if xs.len() < 2 {
            return 0.0;
        }

        let n = xs.len() as f64;
        let sum_x: f64 = xs.iter().sum();
        let sum_y: f64 = ys.iter().sum();
        let sum_xx: f64 = xs.iter().map(|x| x * x).sum();
        let sum_xy: f64 = xs.iter().zip(ys.iter()).map(|(x, y)| x * y).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < REGRESSION_EPSILON {
            return 0.0;
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        (slope * NEPERS_TO_DB) as f32
    }
}

impl Default for StringHealthAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StringHealthAnalyzer {
    fn name(&self) -> &'static str {
        "string-health"
    }

    fn configure(&mut self, config: &AnalysisConfig) -> Result<()> {
        config.validate()?;
        self.dsp = Some(Dsp {
            config: config.clone(),
            spectrum: SpectrumAnalyzer::new(FFT_SIZE, config.sample_rate),
            pitch: PitchDetector::new(config.sample_rate),
        });
        self.reset();
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f32]) -> Result<()> {
        let Some(dsp) = self.dsp.as_mut() else {
            return Err(Error::NotConfigured);
        };

        dsp.spectrum.compute(frame);

        let estimate = dsp.pitch.detect(frame);
        if estimate.is_voiced() && estimate.confidence > MIN_PITCH_CONFIDENCE {
            self.fundamental = estimate.frequency;
            if self.harmonic_history.len() == HISTORY_CAPACITY {
                self.harmonic_history.pop_front();
                self.time_history.pop_front();
            }
            self.harmonic_history
                .push_back(harmonic_magnitudes(&dsp.spectrum, self.fundamental));
            self.time_history.push_back(self.clock);
        }
        self.clock += dsp.config.frame_duration();

        // No note has been accepted yet: publish the zeroed (valid) verdict
        // rather than scoring silence as a healthy string.
        if self.fundamental <= 0.0 {
            self.slot.publish(StringHealthResult::default());
            return Ok(());
        }

        let spectral_centroid = dsp.spectrum.centroid_hz();
        let inharmonicity = harmonic_deviation(&dsp.spectrum, self.fundamental, PEAK_SEARCH_BINS);

        let decay_rate = self.decay_rate();
        let decay_score =
            ((decay_rate - DECAY_FLOOR_DB_S) / (DECAY_CEIL_DB_S - DECAY_FLOOR_DB_S)).clamp(0.0, 1.0);
        let spectral_score = (1.0 - spectral_centroid / CENTROID_FULL_SCALE_HZ).clamp(0.0, 1.0);
        let inharmonicity_score = 1.0 - inharmonicity;

        let health_score = (DECAY_WEIGHT * decay_score
            + SPECTRAL_WEIGHT * spectral_score
            + INHARMONICITY_WEIGHT * inharmonicity_score)
            .clamp(0.0, 1.0);

        self.slot.publish(StringHealthResult {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            health_score,
            decay_rate,
            spectral_centroid,
            inharmonicity,
            fundamental_frequency: self.fundamental,
        });
        Ok(())
    }

    fn reset(&mut self) {
        self.harmonic_history.clear();
        self.time_history.clear();
        self.clock = 0.0;
        self.fundamental = 0.0;
        self.slot.publish(StringHealthResult::default());
    }
}
