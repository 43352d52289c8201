//! Job scheduling and worker supervision.
//!
//! [`Scheduler`] accepts jobs for named services, admits them FIFO up to
//! each service's concurrency cap, and hands admitted jobs to the
//! supervisor, which runs the service's
//! [`JobRunner`](genflow_core::runner::JobRunner) in an isolated task and
//! relays its messages back into the job registry.

pub mod config;
pub mod error;
pub mod events;
pub mod handle;
pub mod registry;
pub mod scheduler;
mod supervisor;
mod sweep;

pub use config::{SchedulerConfig, Service, ServiceConfig};
pub use error::SchedulerError;
pub use events::JobEvent;
pub use handle::JobHandle;
pub use scheduler::Scheduler;
