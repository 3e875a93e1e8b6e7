//! Monophonic pitch detection via the YIN algorithm
//! (de Cheveigné & Kawahara, 2002), fixed to the guitar range.
//!
//! The four steps used here: difference function, cumulative mean
//! normalized difference, absolute-threshold search for the first local
//! minimum (this is what suppresses octave errors), and parabolic
//! interpolation for sub-sample period accuracy.

/// Lowest detectable fundamental. Low E (82.4 Hz) sits comfortably above.
pub const MIN_FREQ_HZ: f32 = 80.0;

/// Highest detectable fundamental, past the upper frets of the high E string.
pub const MAX_FREQ_HZ: f32 = 1200.0;

/// Absolute threshold on the normalized difference. Lower is stricter.
const YIN_THRESHOLD: f32 = 0.15;

/// Fallback ceiling when nothing dips under the threshold: a global minimum
/// above this is treated as unvoiced.
const FALLBACK_CEILING: f32 = 0.5;

/// One frame's pitch verdict.
///
/// The zeroed default means "no pitch". Same frame in, same estimate out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PitchEstimate {
    /// Detected fundamental in Hz (0.0 when unvoiced).
    pub frequency: f32,
    /// Clarity of the detection in [0, 1].
    pub confidence: f32,
}

impl PitchEstimate {
    #[inline]
    pub fn is_voiced(&self) -> bool {
        self.frequency > 0.0 && self.confidence > 0.0
    }
}

/// YIN pitch detector with pre-allocated lag buffers.
pub struct PitchDetector {
    sample_rate: f64,
    min_freq: f32,
    max_freq: f32,
    threshold: f32,
    difference: Vec<f32>,
    normalized: Vec<f32>,
    energy_prefix: Vec<f64>,
}

impl PitchDetector {
    /// Detector fixed to the guitar range (80-1200 Hz, threshold 0.15).
    pub fn new(sample_rate: f64) -> Self {
        Self::with_range(sample_rate, MIN_FREQ_HZ, MAX_FREQ_HZ)
    }

    pub fn with_range(sample_rate: f64, min_freq: f32, max_freq: f32) -> Self {
        let max_period = (sample_rate / min_freq as f64) as usize;
        Self {
            sample_rate,
            min_freq,
            max_freq,
            threshold: YIN_THRESHOLD,
            difference: vec![0.0; max_period + 1],
            normalized: vec![0.0; max_period + 1],
            energy_prefix: Vec::new(),
        }
    }

    /// Smallest frame `detect` can work with: two periods of the lowest
    /// detectable frequency.
    pub fn min_frame_len(&self) -> usize {
        (self.sample_rate / self.min_freq as f64) as usize * 2
    }

    /// Detect the fundamental of one frame.
    ///
    /// Frames shorter than [`min_frame_len`](Self::min_frame_len) yield the
    /// unvoiced default.
    pub fn detect(&mut self, frame: &[f32]) -> PitchEstimate {
        let min_period = (self.sample_rate / self.max_freq as f64) as usize;
        let max_period = ((self.sample_rate / self.min_freq as f64) as usize)
            .min(frame.len() / 2)
            .min(self.difference.len() - 1);

        if max_period <= min_period {
            return PitchEstimate::default();
        }

        self.difference_function(frame, max_period);
        self.normalize(max_period);

        let Some((period, aperiodicity)) = self.pick_period(min_period, max_period) else {
            return PitchEstimate::default();
        };

        let refined = self.refine_period(period, max_period);

        PitchEstimate {
            frequency: (self.sample_rate / refined) as f32,
            confidence: (1.0 - aperiodicity).max(0.0),
        }
    }

    /// d(τ) = Σ_j (x[j] − x[j+τ])² over a window of `max_period` samples,
    /// computed as e(0) + e(τ) − 2·r(τ) with prefix-summed energies.
    fn difference_function(&mut self, frame: &[f32], max_period: usize) {
        let window = max_period;

        self.energy_prefix.clear();
        self.energy_prefix.reserve(frame.len() + 1);
        self.energy_prefix.push(0.0);
        let mut running = 0.0f64;
        for &sample in frame {
            running += sample as f64 * sample as f64;
            self.energy_prefix.push(running);
        }

        let energy = |start: usize| -> f64 {
            self.energy_prefix[(start + window).min(frame.len())] - self.energy_prefix[start]
        };
        let e0 = energy(0);

        self.difference[0] = 0.0;
        for tau in 1..=max_period {
            let mut autocorr = 0.0f64;
            for j in 0..window {
                if j + tau < frame.len() {
                    autocorr += frame[j] as f64 * frame[j + tau] as f64;
                }
            }
            self.difference[tau] = (e0 + energy(tau) - 2.0 * autocorr) as f32;
        }
    }

    /// d'(τ) = d(τ) · τ / Σ_{j≤τ} d(j), with d'(0) = 1.
    fn normalize(&mut self, max_period: usize) {
        self.normalized[0] = 1.0;
        let mut cumulative = 0.0f32;
        for tau in 1..=max_period {
            cumulative += self.difference[tau];
            self.normalized[tau] = if cumulative > 1e-10 {
                self.difference[tau] * tau as f32 / cumulative
            } else {
                1.0
            };
        }
    }

    /// First local minimum under the threshold; falls back to the global
    /// minimum when nothing qualifies. Returns `(period, d'(period))`.
    fn pick_period(&self, min_period: usize, max_period: usize) -> Option<(usize, f32)> {
        let mut tau = min_period;
        while tau < max_period {
            if self.normalized[tau] < self.threshold {
                while tau + 1 < max_period && self.normalized[tau + 1] < self.normalized[tau] {
                    tau += 1;
                }
                return Some((tau, self.normalized[tau]));
            }
            tau += 1;
        }

        let (best_tau, best_val) = (min_period..=max_period)
            .map(|t| (t, self.normalized[t]))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        (best_val < FALLBACK_CEILING).then_some((best_tau, best_val))
    }

    /// Parabola through (τ−1, τ, τ+1) for sub-sample period accuracy.
    fn refine_period(&self, tau: usize, max_period: usize) -> f64 {
        if tau < 1 || tau >= max_period {
            return tau as f64;
        }

        let s0 = self.normalized[tau - 1] as f64;
        let s1 = self.normalized[tau] as f64;
        let s2 = self.normalized[tau + 1] as f64;

        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator.abs() > 1e-10 {
            tau as f64 + (s2 - s0) / denominator
        } else {
            tau as f64
        }
    }
}

/// Interval from `reference` to `freq` in cents (1200 per octave).
///
/// Returns 0 when either frequency is non-positive.
pub fn cents_between(freq: f32, reference: f32) -> f32 {
    if freq <= 0.0 || reference <= 0.0 {
        return 0.0;
    }
    1200.0 * (freq / reference).log2()
}

/// Name of the equal-tempered note nearest to `freq`, e.g. `"E2"` for
/// 82.4 Hz. `None` for non-positive frequencies.
pub fn nearest_note_name(freq: f32) -> Option<String> {
    if freq <= 0.0 {
        return None;
    }

    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let midi = (69.0 + 12.0 * (freq / 440.0).log2()).round().clamp(0.0, 127.0) as i32;
    let name = NAMES[(midi % 12) as usize];
    let octave = midi / 12 - 1;
    Some(format!("{name}{octave}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * core::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    #[test]
    fn test_detects_low_e() {
        let mut detector = PitchDetector::new(SR);
        let estimate = detector.detect(&sine(82.41, 2048));
        assert!(estimate.is_voiced());
        assert!(
            (estimate.frequency - 82.41).abs() < 2.0,
            "expected ~82.41 Hz, got {}",
            estimate.frequency
        );
        assert!(estimate.confidence > 0.7);
    }

    #[test]
    fn test_detects_across_guitar_range() {
        let mut detector = PitchDetector::new(SR);
        for freq in [110.0f32, 196.0, 329.63, 440.0, 1000.0] {
            let estimate = detector.detect(&sine(freq, 2048));
            assert!(estimate.is_voiced(), "should voice {freq} Hz");
            let error = (estimate.frequency - freq).abs() / freq;
            assert!(
                error < 0.01,
                "expected {freq} Hz, got {} Hz",
                estimate.frequency
            );
        }
    }

    #[test]
    fn test_harmonic_stack_does_not_octave_jump() {
        // A rich harmonic series tempts autocorrelation detectors into
        // reporting the second partial; the first-minimum rule must not.
        let frame: Vec<f32> = (0..2048)
            .map(|i| {
                let t = i as f32 / SR as f32;
                (1..=8)
                    .map(|n| (2.0 * core::f32::consts::PI * n as f32 * 110.0 * t).sin() / n as f32)
                    .sum()
            })
            .collect();

        let mut detector = PitchDetector::new(SR);
        let estimate = detector.detect(&frame);
        assert!(estimate.is_voiced());
        assert!(
            (estimate.frequency - 110.0).abs() < 3.0,
            "expected the fundamental, got {} Hz",
            estimate.frequency
        );
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let mut detector = PitchDetector::new(SR);
        let estimate = detector.detect(&vec![0.0; 2048]);
        assert!(estimate.frequency == 0.0 || estimate.confidence < 0.5);
    }

    #[test]
    fn test_short_frame_is_unvoiced() {
        let mut detector = PitchDetector::new(SR);
        assert_eq!(detector.detect(&sine(220.0, 64)), PitchEstimate::default());
    }

    #[test]
    fn test_deterministic() {
        let frame = sine(196.0, 2048);
        let mut detector = PitchDetector::new(SR);
        let first = detector.detect(&frame);
        let second = detector.detect(&frame);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cents_between() {
        assert_eq!(cents_between(440.0, 440.0), 0.0);
        assert!((cents_between(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert!((cents_between(440.0, 880.0) + 1200.0).abs() < 1e-3);
        assert_eq!(cents_between(0.0, 440.0), 0.0);
        assert_eq!(cents_between(440.0, -1.0), 0.0);
    }

    #[test]
    fn test_nearest_note_name() {
        assert_eq!(nearest_note_name(82.41).as_deref(), Some("E2"));
        assert_eq!(nearest_note_name(110.0).as_deref(), Some("A2"));
        assert_eq!(nearest_note_name(440.0).as_deref(), Some("A4"));
        assert_eq!(nearest_note_name(0.0), None);
    }
}
