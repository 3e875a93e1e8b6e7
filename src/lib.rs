//! # fretlab - Live Guitar Diagnostics
//!
//! Ingests a mono stream from a live guitar and continuously publishes
//! three diagnostic verdicts about the instrument:
//!
//! - **Fret buzz** - likelihood in [0, 1] from transient and spectral
//!   anomalies
//! - **Intonation** - cent deviation between the open string and the
//!   twelfth fret, via a guided two-note calibration
//! - **String health** - condition score in [0, 1] fusing harmonic decay,
//!   brightness, and inharmonicity
//!
//! ## Architecture
//!
//! fretlab is an umbrella crate coordinating:
//! - **fretlab-core** - SPSC sample ring, analysis config, audio input tap
//! - **fretlab-dsp** - magnitude spectrum and YIN pitch primitives
//! - **fretlab-analysis** - the three analyzers and the frame-dispatch
//!   engine
//!
//! Data flows one way: the audio callback pushes blocks through the
//! [`InputTap`] into a lock-free ring; a single worker slices the ring into
//! frames and drives the analyzers; each analyzer publishes snapshots a
//! renderer reads at its own pace.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fretlab::prelude::*;
//!
//! let session = DiagnosticsSession::builder()
//!     .sample_rate(48_000.0)
//!     .frame_size(2048)
//!     .build()?;
//!
//! // Hand the tap to the audio layer; call it with each captured block.
//! let tap = session.input_tap();
//!
//! session.start();
//!
//! // Read snapshots from any thread, at any rate.
//! let buzz = session.fret_buzz().latest();
//! println!("buzz likelihood: {:.2}", buzz.buzz_score);
//! # Ok::<(), fretlab::Error>(())
//! ```

/// Re-export of fretlab-core for direct access
pub use fretlab_core as core;

pub use fretlab_core::{AnalysisConfig, Error, InputTap, Result, SampleRing};

/// Re-export of fretlab-dsp for direct access
pub use fretlab_dsp as dsp;

pub use fretlab_dsp::{PitchDetector, PitchEstimate, SpectrumAnalyzer};

/// Re-export of fretlab-analysis for direct access
pub use fretlab_analysis as analysis;

pub use fretlab_analysis::{
    AnalysisEngine, Analyzer, FretBuzzAnalyzer, FretBuzzResult, IntonationAnalyzer,
    IntonationResult, IntonationState, ResultReader, ResultSlot, StringHealthAnalyzer,
    StringHealthResult,
};

mod builder;
mod session;

pub use builder::DiagnosticsSessionBuilder;
pub use session::DiagnosticsSession;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{DiagnosticsSession, DiagnosticsSessionBuilder};

    pub use crate::{
        AnalysisConfig, FretBuzzResult, InputTap, IntonationResult, IntonationState,
        ResultReader, StringHealthResult,
    };
}
