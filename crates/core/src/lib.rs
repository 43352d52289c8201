//! Shared domain types for the genflow job orchestration workspace.
//!
//! This crate has zero internal dependencies so that the client, worker,
//! scheduler and API crates can all depend on it without cycles.

pub mod error;
pub mod job;
pub mod messages;
pub mod outcome;
pub mod params;
pub mod runner;
pub mod types;
