//! Published result snapshots.
//!
//! Every analyzer publishes one of these per processed frame. A snapshot is
//! plain data: once published it is immutable and may be held by a consumer
//! for any duration. The zeroed `Default` values are themselves valid
//! results, matching what the analyzers publish for silence and after a
//! reset.

use std::time::Instant;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Fret-buzz verdict for one frame.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FretBuzzResult {
    /// Publication instant.
    #[cfg_attr(
        feature = "serialization",
        serde(skip, default = "Instant::now")
    )]
    pub timestamp: Instant,
    pub is_valid: bool,
    /// `None` when valid.
    pub error: Option<String>,

    /// Composite buzz likelihood in [0, 1].
    pub buzz_score: f32,
    /// Whether this frame triggered the onset detector.
    pub onset_detected: bool,
    /// Attack-time / zero-crossing blend in [0, 1].
    pub transient_score: f32,
    /// Share of spectral energy in the 4-8 kHz buzz band, in [0, 1].
    pub high_freq_energy_score: f32,
    /// Mean harmonic-peak deviation in [0, 1].
    pub inharmonicity_score: f32,
}

impl Default for FretBuzzResult {
    fn default() -> Self {
        Self {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            buzz_score: 0.0,
            onset_detected: false,
            transient_score: 0.0,
            high_freq_energy_score: 0.0,
            inharmonicity_score: 0.0,
        }
    }
}

/// Phase of the two-note intonation calibration.
///
/// Transitions run strictly forward; only a reset returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum IntonationState {
    /// Waiting for any stable pitch (the open string).
    #[default]
    Idle,
    /// Open-string pitch captured; letting it settle.
    OpenString,
    /// Waiting for the player to fret at the twelfth position.
    WaitForTwelfthFret,
    /// Twelfth-fret pitch captured; letting it settle.
    FrettedString,
    /// Deviation computed; terminal until reset.
    Complete,
}

/// Intonation calibration progress and verdict.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct IntonationResult {
    #[cfg_attr(
        feature = "serialization",
        serde(skip, default = "Instant::now")
    )]
    pub timestamp: Instant,
    pub is_valid: bool,
    pub error: Option<String>,

    pub state: IntonationState,
    /// Open-string fundamental in Hz (0 until captured).
    pub open_string_frequency: f32,
    /// Twelfth-fret fundamental in Hz (0 until captured).
    pub fretted_string_frequency: f32,
    /// Ideal twelfth-fret pitch: double the open string.
    pub expected_fretted_frequency: f32,
    /// Measured-vs-expected deviation in cents.
    pub cent_deviation: f32,
    /// Whether the deviation is within the in-tune tolerance.
    pub is_in_tune: bool,
}

impl Default for IntonationResult {
    fn default() -> Self {
        Self {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            state: IntonationState::Idle,
            open_string_frequency: 0.0,
            fretted_string_frequency: 0.0,
            expected_fretted_frequency: 0.0,
            cent_deviation: 0.0,
            is_in_tune: false,
        }
    }
}

/// String-health verdict for one frame.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StringHealthResult {
    #[cfg_attr(
        feature = "serialization",
        serde(skip, default = "Instant::now")
    )]
    pub timestamp: Instant,
    pub is_valid: bool,
    pub error: Option<String>,

    /// Composite condition score in [0, 1].
    pub health_score: f32,
    /// Harmonic energy decay in dB/s (negative while a note rings out).
    pub decay_rate: f32,
    /// Magnitude-weighted spectral centroid in Hz.
    pub spectral_centroid: f32,
    /// Mean harmonic-peak deviation in [0, 1].
    pub inharmonicity: f32,
    /// Last accepted fundamental in Hz.
    pub fundamental_frequency: f32,
}

impl Default for StringHealthResult {
    fn default() -> Self {
        Self {
            timestamp: Instant::now(),
            is_valid: true,
            error: None,
            health_score: 0.0,
            decay_rate: 0.0,
            spectral_centroid: 0.0,
            inharmonicity: 0.0,
            fundamental_frequency: 0.0,
        }
    }
}
