//! Error types for the fretlab crates.

use thiserror::Error;

/// Error type shared by all fretlab crates.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Analyzer processed a frame before configure()")]
    NotConfigured,

    #[error("Engine is already running")]
    AlreadyRunning,

    #[error("Analyzer registration is closed while the engine runs")]
    RegistrationClosed,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
