//! DispatchActor - Runs deferred sweeps in-process
//!
//! Fast retries are handed to this actor instead of calling the service's own
//! HTTP endpoint. Each received request runs as an independent task against
//! the same [`Orchestrator`] that serves `GET /check`, so a slow recheck never
//! holds up the sweep that scheduled it.
//!
//! ## Message Flow
//!
//! ```text
//! Orchestrator ─schedule_after─► DispatchHandle ─► DispatchActor ─spawn─► run_sweep(single, delay)
//! POST /retry  ─schedule_after─┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument, warn};

use crate::scheduler::{RetryScheduler, ScheduleError};
use crate::sweep::{Orchestrator, SweepRequest};

use super::messages::DispatchCommand;

/// Commands buffered between the handle and the actor
const COMMAND_BUFFER: usize = 32;

/// Rechecks that may be queued or sleeping at the same time
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Actor that executes sweep requests in the background
pub struct DispatchActor {
    orchestrator: Arc<Orchestrator>,

    command_rx: mpsc::Receiver<DispatchCommand>,

    /// Sweeps currently running
    in_flight: JoinSet<()>,
}

impl DispatchActor {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        command_rx: mpsc::Receiver<DispatchCommand>,
    ) -> Self {
        Self {
            orchestrator,
            command_rx,
            in_flight: JoinSet::new(),
        }
    }

    /// Run the actor's main loop
    ///
    /// Exits on `Shutdown` or once every handle has been dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting dispatch actor");

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        DispatchCommand::Run { request, permit } => {
                            debug!("dispatching {request:?}");
                            let orchestrator = self.orchestrator.clone();
                            self.in_flight.spawn(async move {
                                orchestrator.run_sweep(request).await;
                                drop(permit);
                            });
                        }

                        DispatchCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("deferred sweep failed: {e}");
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        if !self.in_flight.is_empty() {
            warn!("aborting {} deferred sweep(s)", self.in_flight.len());
        }
        self.in_flight.shutdown().await;

        debug!("dispatch actor stopped");
    }
}

/// Handle for submitting work to a DispatchActor
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<DispatchCommand>,

    /// One permit per recheck that is queued or running
    slots: Arc<Semaphore>,
}

impl DispatchHandle {
    /// Create a handle together with the receiver its actor will consume
    ///
    /// The orchestrator needs the handle as its scheduler before the actor
    /// can be built around the orchestrator, hence the split construction.
    pub fn channel() -> (Self, mpsc::Receiver<DispatchCommand>) {
        Self::with_max_pending(DEFAULT_MAX_PENDING)
    }

    /// Like [`DispatchHandle::channel`], accepting at most `max_pending`
    /// rechecks that have not finished yet
    pub fn with_max_pending(max_pending: usize) -> (Self, mpsc::Receiver<DispatchCommand>) {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let slots = Arc::new(Semaphore::new(max_pending));
        (Self { sender, slots }, receiver)
    }

    /// Spawn the actor for a receiver obtained from [`DispatchHandle::channel`]
    pub fn spawn_actor(
        orchestrator: Arc<Orchestrator>,
        receiver: mpsc::Receiver<DispatchCommand>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(DispatchActor::new(orchestrator, receiver).run())
    }

    /// Queue a sweep without waiting for it
    ///
    /// Fails with [`ScheduleError::Busy`] when the pending limit is reached
    /// or the command buffer is full.
    pub fn submit(&self, request: SweepRequest) -> Result<(), ScheduleError> {
        if self.sender.is_closed() {
            return Err(ScheduleError::Closed);
        }

        let permit = self.slots.clone().try_acquire_owned().map_err(|_| {
            warn!("rejecting {request:?}: pending recheck limit reached");
            ScheduleError::Busy
        })?;

        self.sender
            .try_send(DispatchCommand::Run { request, permit })
            .map_err(|e| match e {
                TrySendError::Full(_) => ScheduleError::Busy,
                TrySendError::Closed(_) => ScheduleError::Closed,
            })
    }

    /// Number of further rechecks that would be accepted right now
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(DispatchCommand::Shutdown).await;
    }
}

impl RetryScheduler for DispatchHandle {
    fn schedule_after(&self, delay: Duration, target_name: &str) -> Result<(), ScheduleError> {
        self.submit(SweepRequest::single(target_name).with_delay(delay))
    }
}
