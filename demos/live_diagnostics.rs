//! Full-pipeline demo: a synthetic plucked low E streamed through the
//! session in real-time-sized blocks, with all three verdicts printed as
//! they evolve.
//!
//! ```bash
//! cargo run --example live_diagnostics
//! ```

use fretlab::dsp::nearest_note_name;
use fretlab::prelude::*;
use std::time::Duration;

const BLOCK_SIZE: usize = 512;
const PLUCK_SECONDS: usize = 3;

fn main() -> fretlab::Result<()> {
    let session = DiagnosticsSession::builder()
        .sample_rate(48_000.0)
        .frame_size(2048)
        .build()?;

    let tap = session.input_tap();
    session.start();
    println!("streaming a simulated low-E pluck ({PLUCK_SECONDS} s)...\n");

    let sample_rate = session.sample_rate() as f32;
    let blocks = PLUCK_SECONDS * sample_rate as usize / BLOCK_SIZE;
    let mut offset = 0usize;

    for block_idx in 0..blocks {
        let samples: Vec<f32> = (0..BLOCK_SIZE)
            .map(|i| {
                let t = (offset + i) as f32 / sample_rate;
                let envelope = (-1.5 * t).exp();
                let tone: f32 = (1..=8)
                    .map(|n| {
                        (2.0 * core::f32::consts::PI * n as f32 * 82.41 * t).sin() / n as f32
                    })
                    .sum();
                0.4 * envelope * tone
            })
            .collect();
        offset += BLOCK_SIZE;
        tap.process(&samples);

        // Report at ~4 Hz while the audio layer runs at ~94 blocks/s.
        if block_idx % 24 == 23 {
            let buzz = session.fret_buzz().latest();
            let health = session.string_health().latest();
            let note = nearest_note_name(health.fundamental_frequency)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "level {:>5.3}  note {:>3}  buzz {:.2}  health {:.2}  decay {:>7.2} dB/s",
                session.input_level(),
                note,
                buzz.buzz_score,
                health.health_score,
                health.decay_rate,
            );
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    session.stop();

    let health = session.string_health().latest();
    println!(
        "\nfinal verdict: health {:.2} (decay {:.2} dB/s, centroid {:.0} Hz, inharmonicity {:.3})",
        health.health_score, health.decay_rate, health.spectral_centroid, health.inharmonicity,
    );
    println!(
        "frames analyzed: {}, blocks dropped: {}",
        session.frames_processed(),
        session.dropped_blocks()
    );
    Ok(())
}
