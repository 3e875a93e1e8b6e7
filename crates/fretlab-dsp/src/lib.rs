//! # fretlab-dsp
//!
//! Building-block DSP primitives for the fretlab analyzers:
//!
//! - **[`SpectrumAnalyzer`]** - Hann-windowed magnitude spectrum with bin/Hz
//!   conversion, band energy sums, and spectral centroid
//! - **[`PitchDetector`]** - monophonic YIN pitch tracking fixed to the
//!   guitar range (80-1200 Hz)
//!
//! Both primitives pre-allocate all working memory at construction and are
//! deterministic: the same frame always yields the same output.

pub mod pitch;
pub mod spectrum;

pub use pitch::{cents_between, nearest_note_name, PitchDetector, PitchEstimate};
pub use spectrum::SpectrumAnalyzer;
