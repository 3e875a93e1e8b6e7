//! Fret-buzz detection.
//!
//! Buzz shows up as a sharp transient riding on the note, excess energy in
//! the 4-8 kHz band, and harmonic peaks pushed off their ideal positions.
//! Each frame is scored on all three and the weighted blend published as a
//! likelihood in [0, 1].

use crate::harmonics::harmonic_deviation;
use crate::{Analyzer, FretBuzzResult, ResultReader, ResultSlot};
use fretlab_core::{AnalysisConfig, Error, Result};
use fretlab_dsp::{PitchDetector, SpectrumAnalyzer};
use std::time::Instant;

const FFT_SIZE: usize = 2048;
const EPSILON: f32 = 1e-6;

/// Onset when the frame-to-frame RMS ratio exceeds this...
const ONSET_RMS_RATIO: f32 = 1.5;
/// ...or the half-wave-rectified spectral flux does. Same number, different
/// units; both are tunables inherited from field calibration.
const ONSET_FLUX_THRESHOLD: f32 = 1.5;

/// Attack times at or above this map to a transient score of 0.
const ATTACK_FULL_SCALE_SECS: f32 = 0.1;
/// Attack time assigned to frames too quiet to measure.
const ATTACK_SILENCE_SECS: f32 = 1.0;
/// Peak level below which a frame counts as quiet.
const SILENT_PEAK: f32 = 0.01;
/// Zero-crossing rate that saturates the ZCR score.
const ZCR_FULL_SCALE_HZ: f32 = 1000.0;

/// The buzz band.
const BUZZ_BAND_LO_HZ: f32 = 4000.0;
const BUZZ_BAND_HI_HZ: f32 = 8000.0;
/// Reference band for the energy ratio.
const TOTAL_BAND_LO_HZ: f32 = 80.0;
const TOTAL_BAND_HI_HZ: f32 = 12_000.0;

/// Minimum pitch confidence before harmonic deviation contributes.
const MIN_PITCH_CONFIDENCE: f32 = 0.5;
/// Harmonic peaks are searched within this many bins of the expected bin.
const PEAK_SEARCH_BINS: usize = 2;

const TRANSIENT_WEIGHT: f32 = 0.3;
const HIGH_FREQ_WEIGHT: f32 = 0.4;
const INHARMONICITY_WEIGHT: f32 = 0.3;

struct Dsp {
    config: AnalysisConfig,
    spectrum: SpectrumAnalyzer,
    pitch: PitchDetector,
}

/// Scores each frame for fret-buzz likelihood.
pub struct FretBuzzAnalyzer {
    dsp: Option<Dsp>,
    prev_magnitudes: Vec<f32>,
    prev_rms: f32,
    first_frame: bool,
    slot: ResultSlot<FretBuzzResult>,
}

impl FretBuzzAnalyzer {
    pub fn new() -> Self {
        Self {
            dsp: None,
            prev_magnitudes: Vec::new(),
            prev_rms: 0.0,
            first_frame: true,
            slot: ResultSlot::new(),
        }
    }

    /// Consumer handle for published results. Grab this before handing the
    /// analyzer to the engine.
    pub fn reader(&self) -> ResultReader<FretBuzzResult> {
        self.slot.reader()
    }
}

impl Default for FretBuzzAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for FretBuzzAnalyzer {
    fn name(&self) -> &'static str {
        "fret-buzz"
    }

    fn configure(&mut self, config: &AnalysisConfig) -> Result<()> {
        config.validate()?;
        let spectrum = SpectrumAnalyzer::new(FFT_SIZE, config.sample_rate);
        self.prev_magnitudes = vec![0.0; spectrum.num_bins()];
        self.dsp = Some(Dsp {
            config: config.clone(),
            spectrum,
            pitch: PitchDetector::new(config.sample_rate),
        });
        self.prev_rms = 0.0;
        self.first_frame = true;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f32]) -> Result<()> {
        let Some(dsp) = self.dsp.as_mut() else {
            return Err(Error::NotConfigured);
        };

        dsp.spectrum.compute(frame);

        // Half-wave rectified flux against the previous frame's spectrum.
        let flux: f32 = dsp
            .spectrum
            .magnitudes()
            .iter()
            .zip(self.prev_magnitudes.iter())
            .map(|(&mag, &prev)| (mag - prev).max(0.0))
            .sum();

        let rms = frame_rms(frame);
        // The RMS ratio is undefined before a previous frame exists, so the
        // first frame never reports an onset.
        let onset = !self.first_frame
            && ((self.prev_rms > EPSILON && rms / self.prev_rms > ONSET_RMS_RATIO)
                || flux > ONSET_FLUX_THRESHOLD);

        let transient_score = transient_score(frame, dsp.config.sample_rate as f32);
        let high_freq_energy_score = high_freq_energy_score(&dsp.spectrum);

        let estimate = dsp.pitch.detect(frame);
        let inharmonicity_score =
            if estimate.is_voiced() && estimate.confidence >= MIN_PITCH_CONFIDENCE {
                harmonic_deviation(&dsp.spectrum, estimate.frequency, PEAK_SEARCH_BINS)
            } else {
                0.0
            };

        let buzz_score = (TRANSIENT_WEIGHT * transient_score
            + HIGH_FREQ_WEIGHT * high_freq_energy_score
            + INHARMONICITY_WEIGHT * inharmonicity_score)
            .clamp(0.0, 1.0);

        self.slot.publish(FretBuzzResult {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            buzz_score,
            onset_detected: onset,
            transient_score,
            high_freq_energy_score,
            inharmonicity_score,
        });

        self.prev_magnitudes
            .copy_from_slice(dsp.spectrum.magnitudes());
        self.prev_rms = rms;
        self.first_frame = false;
        Ok(())
    }

    fn reset(&mut self) {
        self.prev_magnitudes.fill(0.0);
        self.prev_rms = 0.0;
        self.first_frame = true;
        self.slot.publish(FretBuzzResult::default());
    }
}

fn frame_rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
    (sum_sq / frame.len() as f32).sqrt()
}

/// Blend of attack sharpness and zero-crossing density, each in [0, 1].
fn transient_score(frame: &[f32], sample_rate: f32) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }

    let peak = frame.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
    let attack_secs = if peak < SILENT_PEAK {
        ATTACK_SILENCE_SECS
    } else {
        let threshold = 0.9 * peak;
        let reached = frame
            .iter()
            .position(|&s| s.abs() >= threshold)
            .unwrap_or(0);
        reached as f32 / sample_rate
    };
    let attack_score = (1.0 - attack_secs / ATTACK_FULL_SCALE_SECS).clamp(0.0, 1.0);

    let crossings = frame.windows(2).filter(|pair| pair[0] * pair[1] < 0.0).count();
    let frame_secs = frame.len() as f32 / sample_rate;
    let zcr_score = (crossings as f32 / frame_secs / ZCR_FULL_SCALE_HZ).clamp(0.0, 1.0);

    0.5 * (attack_score + zcr_score)
}

/// Share of energy in the buzz band relative to the full guitar band.
fn high_freq_energy_score(spectrum: &SpectrumAnalyzer) -> f32 {
    let total = spectrum.band_energy(TOTAL_BAND_LO_HZ, TOTAL_BAND_HI_HZ);
    if total < EPSILON {
        return 0.0;
    }
    (spectrum.band_energy(BUZZ_BAND_LO_HZ, BUZZ_BAND_HI_HZ) / total).clamp(0.0, 1.0)
}
