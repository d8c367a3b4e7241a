//! Background actors
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle over a Tokio channel.
//!
//! ## Actor Types
//!
//! - **DispatchActor**: executes deferred single-target sweeps (fast retries
//!   and `POST /retry` requests) without blocking the caller
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the handle sends `DispatchCommand`s over a bounded mpsc
//!    channel with `try_send`, so scheduling never awaits and rejects work
//!    once too many rechecks are pending
//! 2. **Fire-and-forget**: no result is reported back to the scheduler

pub mod dispatcher;
pub mod messages;
