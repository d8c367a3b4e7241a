//! API shared state

use std::sync::Arc;

use crate::scheduler::RetryScheduler;
use crate::sweep::Orchestrator;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Runs `GET /check` sweeps inline
    pub orchestrator: Arc<Orchestrator>,

    /// Receives `POST /retry` requests, same scheduler the orchestrator uses
    pub scheduler: Arc<dyn RetryScheduler>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator>, scheduler: Arc<dyn RetryScheduler>) -> Self {
        Self {
            orchestrator,
            scheduler,
        }
    }
}
