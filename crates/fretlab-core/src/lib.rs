//! # fretlab-core
//!
//! Runtime plumbing for the fretlab diagnostics engine:
//!
//! - **[`SampleRing`]** - lock-free SPSC ring bridging the real-time capture
//!   callback to the analysis worker
//! - **[`AnalysisConfig`]** - immutable parameter bundle handed to analyzers
//! - **[`InputTap`]** - the callable registered with the audio layer; forwards
//!   captured blocks into the ring and maintains an atomic level reading
//! - **[`Error`]** / **[`Result`]** - shared error type for all fretlab crates
//!
//! Everything on the capture path is wait-free and allocation-free after
//! construction. The ring and the tap are the only pieces of this workspace
//! the audio callback ever touches.
//!
//! ## Example
//!
//! ```
//! use fretlab_core::{InputTap, SampleRing};
//! use std::sync::Arc;
//!
//! let ring = Arc::new(SampleRing::new(4096));
//! let tap = InputTap::new(ring.clone());
//!
//! // Audio callback side (the sole producer):
//! tap.process(&[0.1, -0.2, 0.3]);
//!
//! // Worker side (the sole consumer):
//! let mut frame = [0.0f32; 3];
//! assert_eq!(ring.read(&mut frame), 3);
//! assert_eq!(frame, [0.1, -0.2, 0.3]);
//! ```

mod config;
mod error;
mod ring;
mod tap;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use ring::SampleRing;
pub use tap::InputTap;
