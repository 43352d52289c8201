/// Errors returned synchronously by the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    /// No service is registered under this id.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The scheduler has been shut down and accepts no more jobs.
    #[error("Scheduler is shut down")]
    ShutDown,

    /// A service definition was rejected at startup.
    #[error("Invalid service {id}: {reason}")]
    InvalidService { id: String, reason: String },
}
