//! Walks the intonation calibration end to end with a simulated A string
//! whose twelfth fret rings slightly sharp, then prints the cent verdict.
//!
//! ```bash
//! cargo run --example intonation_calibration
//! ```

use fretlab::prelude::*;
use std::time::Duration;

const OPEN_HZ: f32 = 110.0;
/// A hair sharp of the ideal 220 Hz octave (~15.6 cents).
const FRETTED_HZ: f32 = 222.0;

fn main() -> fretlab::Result<()> {
    let session = DiagnosticsSession::builder().build()?;
    let tap = session.input_tap();
    let reader = session.intonation();
    session.start();

    let frame_size = session.frame_size();
    let sample_rate = session.sample_rate() as f32;
    let mut offset = 0usize;
    let mut last_state = reader.latest().state;
    println!("state: {last_state:?}");

    let mut feed = |freq: f32, offset: &mut usize| {
        let frame: Vec<f32> = (0..frame_size)
            .map(|i| {
                let t = (*offset + i) as f32 / sample_rate;
                (2.0 * core::f32::consts::PI * freq * t).sin()
            })
            .collect();
        *offset += frame_size;
        tap.process(&frame);
        std::thread::sleep(Duration::from_millis(5));
    };

    // Open string until the machine asks for the twelfth fret, then the
    // fretted note until the verdict lands.
    for _ in 0..120 {
        feed(OPEN_HZ, &mut offset);
        let state = reader.latest().state;
        if state != last_state {
            println!("state: {state:?}");
            last_state = state;
        }
        if state == IntonationState::WaitForTwelfthFret {
            break;
        }
    }
    for _ in 0..120 {
        feed(FRETTED_HZ, &mut offset);
        let state = reader.latest().state;
        if state != last_state {
            println!("state: {state:?}");
            last_state = state;
        }
        if state == IntonationState::Complete {
            break;
        }
    }

    session.stop();

    let result = reader.latest();
    println!(
        "\nopen {:.2} Hz, fretted {:.2} Hz (expected {:.2} Hz)",
        result.open_string_frequency,
        result.fretted_string_frequency,
        result.expected_fretted_frequency,
    );
    println!(
        "deviation: {:+.1} cents -> {}",
        result.cent_deviation,
        if result.is_in_tune {
            "in tune"
        } else {
            "adjust the saddle"
        }
    );
    Ok(())
}
