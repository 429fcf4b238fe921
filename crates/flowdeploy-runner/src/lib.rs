//! Flowdeploy Runner
//!
//! This crate runs flows locally. Tasks execute sequentially in dependency
//! order with their inputs rendered from minijinja templates.

mod error;
mod executor;
mod input;
mod runner;

pub use error::RunError;
pub use executor::{DefaultExecutor, TaskExecutor};
pub use runner::{FlowRunResult, FlowRunner, RunnerConfig, TaskRun, TaskState};
