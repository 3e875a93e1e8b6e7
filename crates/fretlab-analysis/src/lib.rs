//! # fretlab-analysis
//!
//! The diagnostic heart of fretlab. An [`AnalysisEngine`] worker slices the
//! sample ring into fixed-size frames and dispatches each frame, in order,
//! to the registered analyzers:
//!
//! - **[`FretBuzzAnalyzer`]** - likelihood in [0, 1] that a frame exhibits
//!   fret buzz, from transient shape, high-frequency energy, and harmonic
//!   deviation
//! - **[`IntonationAnalyzer`]** - cent deviation between an open string and
//!   the same string at the twelfth fret, driven by a calibration state
//!   machine
//! - **[`StringHealthAnalyzer`]** - string condition in [0, 1] fusing
//!   harmonic decay rate, spectral brightness, and inharmonicity
//!
//! Each analyzer publishes into its own [`ResultSlot`]; consumers hold a
//! [`ResultReader`] and read coherent snapshots at any rate without
//! touching the worker.
//!
//! ## Example
//!
//! ```no_run
//! use fretlab_analysis::{AnalysisEngine, FretBuzzAnalyzer};
//! use fretlab_core::{AnalysisConfig, SampleRing};
//! use std::sync::Arc;
//!
//! let ring = Arc::new(SampleRing::new(2048 * 16));
//! let engine = AnalysisEngine::new(ring.clone(), AnalysisConfig::default());
//!
//! let analyzer = FretBuzzAnalyzer::new();
//! let reader = analyzer.reader();
//! engine.register(Box::new(analyzer))?;
//!
//! engine.start();
//! // audio side: ring.write(block) per captured block
//! let buzz = reader.latest();
//! println!("buzz likelihood: {:.2}", buzz.buzz_score);
//! engine.stop();
//! # Ok::<(), fretlab_core::Error>(())
//! ```

mod analyzer;
mod engine;
mod fret_buzz;
mod harmonics;
mod intonation;
mod result;
mod slot;
mod string_health;

pub use analyzer::Analyzer;
pub use engine::AnalysisEngine;
pub use fret_buzz::FretBuzzAnalyzer;
pub use intonation::IntonationAnalyzer;
pub use result::{FretBuzzResult, IntonationResult, IntonationState, StringHealthResult};
pub use slot::{ResultReader, ResultSlot};
pub use string_health::StringHealthAnalyzer;

pub use fretlab_core::{AnalysisConfig, Error, Result};
