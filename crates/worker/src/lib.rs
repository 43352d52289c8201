//! Generation worker units.
//!
//! - [`GenerationWorker`] runs one job in-process: validates parameters,
//!   prepares input images through an [`ImageSource`], calls the
//!   [`RetryingClient`](genflow_client::RetryingClient) once, and reports
//!   the outcome over the job's outbox.
//! - [`config::client_config_from_env`] builds the client configuration
//!   from environment variables.

pub mod config;
pub mod error;
pub mod image_source;
pub mod unit;

pub use error::WorkerError;
pub use image_source::{FileImageSource, ImageSource, ImageSourceError};
pub use unit::GenerationWorker;
