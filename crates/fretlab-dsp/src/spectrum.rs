//! Hann-windowed magnitude spectrum.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Denominator floor for energy ratios and the centroid.
const EPSILON: f32 = 1e-6;

/// Forward-FFT magnitude spectrum with a fixed Hann window.
///
/// The FFT plan, window, and all buffers are built once; `compute` performs
/// no allocation. Frames shorter than the FFT size are zero-padded, longer
/// frames are truncated.
pub struct SpectrumAnalyzer {
    sample_rate: f64,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f64) -> Self {
        let fft_size = fft_size.next_power_of_two();
        Self {
            sample_rate,
            fft_size,
            fft: FftPlanner::new().plan_fft_forward(fft_size),
            window: hann_window(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            magnitudes: vec![0.0; fft_size / 2],
        }
    }

    /// Number of magnitude bins (`fft_size / 2`).
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Half the sample rate; no bin sits at or above this.
    #[inline]
    pub fn nyquist_hz(&self) -> f32 {
        (self.sample_rate / 2.0) as f32
    }

    /// Window, transform, and return the `fft_size / 2` bin magnitudes.
    pub fn compute(&mut self, frame: &[f32]) -> &[f32] {
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        for (mag, bin) in self.magnitudes.iter_mut().zip(self.scratch.iter()) {
            *mag = bin.norm();
        }
        &self.magnitudes
    }

    /// Magnitudes from the most recent `compute`.
    #[inline]
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Center frequency of `bin` in Hz.
    #[inline]
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        (bin as f64 * self.sample_rate / self.fft_size as f64) as f32
    }

    /// Nearest bin to `freq`, clamped to the valid range.
    #[inline]
    pub fn bin_of(&self, freq: f32) -> usize {
        let bin = (freq as f64 * self.fft_size as f64 / self.sample_rate).round();
        (bin.max(0.0) as usize).min(self.num_bins() - 1)
    }

    /// Magnitude at the bin nearest to `freq`.
    #[inline]
    pub fn magnitude_at(&self, freq: f32) -> f32 {
        self.magnitudes[self.bin_of(freq)]
    }

    /// Sum of bin magnitudes whose center frequency lies in `[lo_hz, hi_hz]`.
    pub fn band_energy(&self, lo_hz: f32, hi_hz: f32) -> f32 {
        self.magnitudes
            .iter()
            .enumerate()
            .filter(|(bin, _)| {
                let f = self.bin_frequency(*bin);
                f >= lo_hz && f <= hi_hz
            })
            .map(|(_, &mag)| mag)
            .sum()
    }

    /// Magnitude-weighted mean frequency over the whole spectrum, in Hz.
    ///
    /// Returns 0 for (near-)silent spectra.
    pub fn centroid_hz(&self) -> f32 {
        let total: f32 = self.magnitudes.iter().sum();
        if total < EPSILON {
            return 0.0;
        }
        let weighted: f32 = self
            .magnitudes
            .iter()
            .enumerate()
            .map(|(bin, &mag)| mag * self.bin_frequency(bin))
            .sum();
        weighted / total
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * core::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: f64 = 48_000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * core::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    #[test]
    fn test_peak_bin_matches_tone() {
        let mut spectrum = SpectrumAnalyzer::new(2048, SR);
        let mags = spectrum.compute(&sine(1000.0, 2048));

        let peak_bin = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();
        assert_eq!(peak_bin, spectrum.bin_of(1000.0));
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut spectrum = SpectrumAnalyzer::new(2048, SR);
        let mags = spectrum.compute(&vec![0.0; 2048]);
        assert!(mags.iter().all(|&m| m == 0.0));
        assert_eq!(spectrum.centroid_hz(), 0.0);
    }

    #[test]
    fn test_centroid_tracks_tone() {
        let mut spectrum = SpectrumAnalyzer::new(2048, SR);
        spectrum.compute(&sine(5000.0, 2048));
        let centroid = spectrum.centroid_hz();
        // Hann leakage keeps it near, not on, the tone.
        assert!(
            (centroid - 5000.0).abs() < 200.0,
            "centroid {centroid} Hz should sit near 5 kHz"
        );
    }

    #[test]
    fn test_band_energy_concentrates_on_tone() {
        let mut spectrum = SpectrumAnalyzer::new(2048, SR);
        spectrum.compute(&sine(5000.0, 2048));
        let in_band = spectrum.band_energy(4000.0, 6000.0);
        let out_of_band = spectrum.band_energy(8000.0, 12_000.0);
        assert!(in_band > 10.0 * out_of_band.max(1e-6));
    }

    #[test]
    fn test_short_frame_is_zero_padded() {
        let mut spectrum = SpectrumAnalyzer::new(2048, SR);
        let mags = spectrum.compute(&sine(1000.0, 512)).to_vec();
        let peak_bin = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();
        // Coarser effective resolution, but the peak stays in the vicinity.
        let expected = spectrum.bin_of(1000.0);
        assert!((peak_bin as i64 - expected as i64).abs() <= 4);
    }

    #[test]
    fn test_bin_frequency_round_trip() {
        let spectrum = SpectrumAnalyzer::new(2048, SR);
        for bin in [0, 1, 100, 512, 1023] {
            assert_eq!(spectrum.bin_of(spectrum.bin_frequency(bin)), bin);
        }
        assert_relative_eq!(spectrum.bin_frequency(1), 48_000.0 / 2048.0, epsilon = 1e-3);
    }
}
