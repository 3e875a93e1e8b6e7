//! The analyzer abstraction the engine dispatches to.

use fretlab_core::{AnalysisConfig, Result};

/// One diagnostic unit driven by the engine worker.
///
/// The engine calls `configure` once at registration (in the registering
/// thread), then `process_frame` for every frame in temporal order from the
/// worker. Calls are never concurrent: an analyzer owns its internal state
/// outright and needs no synchronization of its own.
///
/// Results travel through the analyzer's own result slot (see
/// [`ResultReader`](crate::ResultReader)); a reader handle is obtained from
/// the concrete type before registration, since the boxed analyzer moves
/// into the engine.
pub trait Analyzer: Send {
    /// Stable name for diagnostics.
    fn name(&self) -> &'static str;

    /// Accept the engine's configuration. Refuses invalid parameters with
    /// [`Error::InvalidConfig`](fretlab_core::Error::InvalidConfig).
    fn configure(&mut self, config: &AnalysisConfig) -> Result<()>;

    /// Analyze one frame and publish a result.
    ///
    /// Must not block or sleep; every step is O(frame) or O(history).
    /// Before `configure` this returns
    /// [`Error::NotConfigured`](fretlab_core::Error::NotConfigured) and
    /// publishes nothing.
    fn process_frame(&mut self, frame: &[f32]) -> Result<()>;

    /// Drop accumulated state and publish a zeroed (but valid) result.
    fn reset(&mut self);
}
