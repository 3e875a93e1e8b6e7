//! Intonation measurement via a two-note calibration.
//!
//! The player sounds the open string, then the same string at the twelfth
//! fret. A perfectly intonated string doubles its open frequency there; the
//! analyzer reports the deviation from that ideal in cents.
//!
//! Time is kept on the audio clock (accumulated frame duration), so the
//! machine advances identically for a given sample stream whether frames
//! arrive in real time or faster.

use crate::{Analyzer, IntonationResult, IntonationState, ResultReader, ResultSlot};
use fretlab_core::{AnalysisConfig, Error, Result};
use fretlab_dsp::{cents_between, PitchDetector};
use std::time::Instant;

/// Rolling pitch accumulator depth; oldest entries shift out at capacity.
const ACCUMULATOR_CAPACITY: usize = 100;
/// Pitch estimates below this confidence are not accumulated.
const MIN_PITCH_CONFIDENCE: f32 = 0.7;
/// Accumulated samples required before stability is considered.
const STABILITY_MIN_SAMPLES: usize = 10;
/// Standard deviation ceiling for a stable pitch.
const STABILITY_MAX_STDEV_HZ: f32 = 2.0;
/// Time a state must hold before the dwell-gated transitions fire.
const DWELL_SECS: f64 = 0.5;
/// Relative tolerance for recognizing the octave at the twelfth fret.
const OCTAVE_TOLERANCE: f32 = 0.10;
/// In-tune verdict threshold in cents.
const IN_TUNE_CENTS: f32 = 5.0;

struct Dsp {
    config: AnalysisConfig,
    pitch: PitchDetector,
}

/// Drives the calibration state machine and reports cent deviation.
pub struct IntonationAnalyzer {
    dsp: Option<Dsp>,
    state: IntonationState,
    /// Seconds of audio spent in the current state.
    state_elapsed: f64,
    accumulator: Vec<f32>,
    open_freq: f32,
    fretted_freq: f32,
    cent_deviation: f32,
    is_in_tune: bool,
    slot: ResultSlot<IntonationResult>,
}

impl IntonationAnalyzer {
    pub fn new() -> Self {
        Self {
            dsp: None,
            state: IntonationState::Idle,
            state_elapsed: 0.0,
            accumulator: Vec::with_capacity(ACCUMULATOR_CAPACITY),
            open_freq: 0.0,
            fretted_freq: 0.0,
            cent_deviation: 0.0,
            is_in_tune: false,
            slot: ResultSlot::new(),
        }
    }

    /// Consumer handle for published results. Grab this before handing the
    /// analyzer to the engine.
    pub fn reader(&self) -> ResultReader<IntonationResult> {
        self.slot.reader()
    }

    fn accumulate(&mut self, freq: f32) {
        if self.accumulator.len() == ACCUMULATOR_CAPACITY {
            self.accumulator.copy_within(1.., 0);
            self.accumulator[ACCUMULATOR_CAPACITY - 1] = freq;
        } else {
            self.accumulator.push(freq);
        }
    }

    /// Median of the accumulated pitches, if enough have gathered and they
    /// agree to within the stability ceiling.
    fn stable_pitch(&self) -> Option<f32> {
        if self.accumulator.len() < STABILITY_MIN_SAMPLES {
            return None;
        }

        let len = self.accumulator.len() as f32;
        let mean = self.accumulator.iter().sum::<f32>() / len;
        let variance = self
            .accumulator
            .iter()
            .map(|&p| (p - mean) * (p - mean))
            .sum::<f32>()
            / len;
        if variance.sqrt() >= STABILITY_MAX_STDEV_HZ {
            return None;
        }

        let mut sorted = self.accumulator.clone();
        sorted.sort_by(f32::total_cmp);
        Some(sorted[sorted.len() / 2])
    }

    fn enter(&mut self, next: IntonationState) {
        self.state = next;
        self.state_elapsed = 0.0;
        self.accumulator.clear();
    }

    fn advance(&mut self) {
        let stable = self.stable_pitch();
        let dwelled = self.state_elapsed >= DWELL_SECS;

        match self.state {
            IntonationState::Idle => {
                if let Some(pitch) = stable {
                    self.open_freq = pitch;
                    self.enter(IntonationState::OpenString);
                }
            }
            IntonationState::OpenString => {
                if stable.is_some() && dwelled {
                    self.enter(IntonationState::WaitForTwelfthFret);
                }
            }
            IntonationState::WaitForTwelfthFret => {
                if let Some(pitch) = stable {
                    let target = 2.0 * self.open_freq;
                    if target > 0.0 && (pitch - target).abs() / target < OCTAVE_TOLERANCE {
                        self.fretted_freq = pitch;
                        self.enter(IntonationState::FrettedString);
                    }
                }
            }
            IntonationState::FrettedString => {
                if stable.is_some() && dwelled {
                    self.finalize_deviation();
                    self.enter(IntonationState::Complete);
                }
            }
            IntonationState::Complete => {}
        }
    }

    fn finalize_deviation(&mut self) {
        if self.open_freq <= 0.0 || self.fretted_freq <= 0.0 {
            self.cent_deviation = 0.0;
            self.is_in_tune = false;
            return;
        }
        self.cent_deviation = cents_between(self.fretted_freq, 2.0 * self.open_freq);
        self.is_in_tune = self.cent_deviation.abs() <= IN_TUNE_CENTS;
    }

    fn publish(&self) {
        self.slot.publish(IntonationResult {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            state: self.state,
            open_string_frequency: self.open_freq,
            fretted_string_frequency: self.fretted_freq,
            expected_fretted_frequency: 2.0 * self.open_freq,
            cent_deviation: self.cent_deviation,
            is_in_tune: self.is_in_tune,
        });
    }
}

impl Default for IntonationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for IntonationAnalyzer {
    fn name(&self) -> &'static str {
        "intonation"
    }

    fn configure(&mut self, config: &AnalysisConfig) -> Result<()> {
        config.validate()?;
        self.dsp = Some(Dsp {
            config: config.clone(),
            pitch: PitchDetector::new(config.sample_rate),
        });
        self.reset();
        Ok(())
    }

    fn process_frame(&mut self, frame: &[f32]) -> Result<()> {
        let Some(dsp) = self.dsp.as_mut() else {
            return Err(Error::NotConfigured);
        };

        let estimate = dsp.pitch.detect(frame);
        let frame_secs = dsp.config.frame_duration();
        if estimate.is_voiced() && estimate.confidence >= MIN_PITCH_CONFIDENCE {
            self.accumulate(estimate.frequency);
        }

        self.state_elapsed += frame_secs;
        self.advance();
        self.publish();
        Ok(())
    }

    fn reset(&mut self) {
        self.state = IntonationState::Idle;
        self.state_elapsed = 0.0;
        self.accumulator.clear();
        self.open_freq = 0.0;
        self.fretted_freq = 0.0;
        self.cent_deviation = 0.0;
        self.is_in_tune = false;
        self.slot.publish(IntonationResult::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;
    const FRAME: usize = 2048;

    fn configured() -> IntonationAnalyzer {
        let mut analyzer = IntonationAnalyzer::new();
        analyzer.configure(&AnalysisConfig::new(SR, FRAME)).unwrap();
        analyzer
    }

    /// Feed `frames` consecutive frames of a pure sine, phase-continuous
    /// across the whole run via the sample offset.
    fn drive(analyzer: &mut IntonationAnalyzer, freq: f32, frames: usize, offset: &mut usize) {
        for _ in 0..frames {
            let frame: Vec<f32> = (0..FRAME)
                .map(|i| {
                    let t = (*offset + i) as f32 / SR as f32;
                    (2.0 * core::f32::consts::PI * freq * t).sin()
                })
                .collect();
            *offset += FRAME;
            analyzer.process_frame(&frame).unwrap();
        }
    }

    #[test]
    fn test_open_string_locks_within_two_hz() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        // ~600 ms of low E.
        drive(&mut analyzer, 82.41, 15, &mut offset);

        let result = reader.latest();
        assert!(matches!(
            result.state,
            IntonationState::OpenString | IntonationState::WaitForTwelfthFret
        ));
        assert!(
            (result.open_string_frequency - 82.41).abs() < 2.0,
            "expected ~82.41 Hz, got {}",
            result.open_string_frequency
        );
        assert!(
            (result.expected_fretted_frequency - 2.0 * result.open_string_frequency).abs() < 1e-3
        );
    }

    #[test]
    fn test_full_calibration_reaches_complete() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        // Open A string until the machine asks for the twelfth fret.
        for _ in 0..60 {
            drive(&mut analyzer, 110.0, 1, &mut offset);
            if reader.latest().state == IntonationState::WaitForTwelfthFret {
                break;
            }
        }
        assert_eq!(reader.latest().state, IntonationState::WaitForTwelfthFret);

        // Fret at the twelfth: the octave.
        drive(&mut analyzer, 220.0, 30, &mut offset);

        let result = reader.latest();
        assert_eq!(result.state, IntonationState::Complete);
        assert!((result.open_string_frequency - 110.0).abs() < 2.0);
        assert!((result.fretted_string_frequency - 220.0).abs() < 4.0);
        assert!(
            result.cent_deviation.abs() <= 5.0,
            "perfect octave should read in tune, got {} cents",
            result.cent_deviation
        );
        assert!(result.is_in_tune);
    }

    #[test]
    fn test_off_octave_pitch_does_not_advance() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        for _ in 0..60 {
            drive(&mut analyzer, 110.0, 1, &mut offset);
            if reader.latest().state == IntonationState::WaitForTwelfthFret {
                break;
            }
        }

        // A fifth above the octave target is well outside the 10% gate.
        drive(&mut analyzer, 330.0, 30, &mut offset);
        assert_eq!(reader.latest().state, IntonationState::WaitForTwelfthFret);
    }

    #[test]
    fn test_low_confidence_frames_do_not_accumulate() {
        let mut analyzer = configured();
        let reader = analyzer.reader();

        for _ in 0..20 {
            analyzer.process_frame(&vec![0.0; FRAME]).unwrap();
        }
        assert_eq!(reader.latest().state, IntonationState::Idle);
        assert_eq!(reader.latest().open_string_frequency, 0.0);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        drive(&mut analyzer, 110.0, 15, &mut offset);
        assert_ne!(reader.latest().state, IntonationState::Idle);

        analyzer.reset();
        let result = reader.latest();
        assert_eq!(result.state, IntonationState::Idle);
        assert_eq!(result.open_string_frequency, 0.0);
        assert_eq!(result.fretted_string_frequency, 0.0);
        assert_eq!(result.cent_deviation, 0.0);
        assert!(!result.is_in_tune);
    }

    #[test]
    fn test_reset_twice_equals_reset_once() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        drive(&mut analyzer, 110.0, 15, &mut offset);
        analyzer.reset();
        let once = reader.latest();
        analyzer.reset();
        let twice = reader.latest();

        assert_eq!(once.state, twice.state);
        assert_eq!(once.open_string_frequency, twice.open_string_frequency);
        assert_eq!(once.cent_deviation, twice.cent_deviation);
        assert_eq!(once.is_in_tune, twice.is_in_tune);
    }

    #[test]
    fn test_states_never_move_backward() {
        let mut analyzer = configured();
        let reader = analyzer.reader();
        let mut offset = 0;

        let order = |s: IntonationState| match s {
            IntonationState::Idle => 0,
            IntonationState::OpenString => 1,
            IntonationState::WaitForTwelfthFret => 2,
            IntonationState::FrettedString => 3,
            IntonationState::Complete => 4,
        };

        let mut last = 0;
        for _ in 0..40 {
            drive(&mut analyzer, 110.0, 1, &mut offset);
            let seen = order(reader.latest().state);
            assert!(seen >= last, "state machine moved backward");
            last = seen;
        }
    }
}
