//! Message types for actor communication

use tokio::sync::OwnedSemaphorePermit;

use crate::sweep::SweepRequest;

/// Commands that can be sent to the DispatchActor
#[derive(Debug)]
pub enum DispatchCommand {
    /// Run a sweep in its own task
    ///
    /// The sender is never told about the outcome. The permit is held until
    /// the sweep finishes and frees one pending slot on the handle.
    Run {
        request: SweepRequest,
        permit: OwnedSemaphorePermit,
    },

    /// Stop accepting work and abort sweeps still in flight
    Shutdown,
}
