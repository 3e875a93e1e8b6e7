//! Test helpers and fixtures for fretlab integration tests.
//!
//! All generators are deterministic so the end-to-end scenarios reproduce
//! bit-for-bit across runs.

#![allow(dead_code)]

use fretlab::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48_000.0;

/// Standard frame size for deterministic testing
pub const TEST_FRAME_SIZE: usize = 2048;

/// Create a session with the standard test configuration.
pub fn test_session() -> DiagnosticsSession {
    DiagnosticsSession::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .frame_size(TEST_FRAME_SIZE)
        .build()
        .expect("failed to build test session")
}

/// Pure sine at `frequency`, starting at sample `offset` for phase
/// continuity across consecutive calls.
pub fn sine(frequency: f32, num_samples: usize, offset: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = (offset + i) as f32 / TEST_SAMPLE_RATE as f32;
            (2.0 * core::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Harmonic stack at `f0` with 1/n partial weights, peak-normalized.
pub fn harmonic_tone(f0: f32, partials: usize, num_samples: usize, offset: usize) -> Vec<f32> {
    let raw: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = (offset + i) as f32 / TEST_SAMPLE_RATE as f32;
            (1..=partials)
                .map(|n| (2.0 * core::f32::consts::PI * n as f32 * f0 * t).sin() / n as f32)
                .sum()
        })
        .collect();
    let peak = raw.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
    if peak > 0.0 {
        raw.iter().map(|&s| s / peak).collect()
    } else {
        raw
    }
}

/// Generate silence (zero samples).
pub fn silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Reproducible noise in [-1, 1) from a simple LCG.
pub fn noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..num_samples)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (1u64 << 30) as f32) - 1.0
        })
        .collect()
}
