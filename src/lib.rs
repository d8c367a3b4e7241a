pub mod actors;
pub mod api;
pub mod config;
pub mod discord;
pub mod monitors;
pub mod notifier;
pub mod registry;
pub mod scheduler;
pub mod sweep;
pub mod util;

pub use monitors::probe::{CheckResult, Status};
pub use notifier::{EventKind, NotificationPayload};
pub use registry::{Registry, Target};
pub use sweep::{Orchestrator, SweepMode, SweepOutcome, SweepRequest, SweepSettings};
