//! Harmonic-series measurements shared by the analyzers.

use fretlab_dsp::SpectrumAnalyzer;

/// Harmonics tracked per fundamental, n = 1..=10.
pub(crate) const HARMONIC_COUNT: usize = 10;

/// Mean relative deviation of observed harmonic peaks from the ideal
/// integer multiples of `f0`, clamped to [0, 1].
///
/// For each harmonic the peak is searched within `search_radius` bins of
/// the expected bin. Harmonics at or above Nyquist are skipped; `f0 <= 0`
/// yields 0.
pub(crate) fn harmonic_deviation(
    spectrum: &SpectrumAnalyzer,
    f0: f32,
    search_radius: usize,
) -> f32 {
    if f0 <= 0.0 {
        return 0.0;
    }

    let mags = spectrum.magnitudes();
    let mut total = 0.0f32;
    let mut counted = 0usize;

    for n in 1..=HARMONIC_COUNT {
        let target = n as f32 * f0;
        if target >= spectrum.nyquist_hz() {
            break;
        }

        let expected = spectrum.bin_of(target);
        let lo = expected.saturating_sub(search_radius);
        let hi = (expected + search_radius).min(spectrum.num_bins() - 1);
        let peak_bin = (lo..=hi)
            .max_by(|a, b| mags[*a].total_cmp(&mags[*b]))
            .unwrap_or(expected);

        total += (spectrum.bin_frequency(peak_bin) - target).abs() / target;
        counted += 1;
    }

    if counted == 0 {
        0.0
    } else {
        (total / counted as f32).clamp(0.0, 1.0)
    }
}

/// Magnitudes at the bins nearest each expected harmonic of `f0`.
///
/// Harmonics at or above Nyquist read as 0.
pub(crate) fn harmonic_magnitudes(spectrum: &SpectrumAnalyzer, f0: f32) -> [f32; HARMONIC_COUNT] {
    let mut out = [0.0f32; HARMONIC_COUNT];
    if f0 <= 0.0 {
        return out;
    }

    for (n, slot) in out.iter_mut().enumerate() {
        let target = (n + 1) as f32 * f0;
        if target >= spectrum.nyquist_hz() {
            break;
        }
        *slot = spectrum.magnitude_at(target);
    }
    out
}
