//! Flowdeploy Registry
//!
//! This crate registers flows with the orchestration service. A
//! [`FlowDeployment`] walks a flows directory, extracts one flow per file,
//! binds copies of the shared storage and run descriptors, and hands each
//! flow to an [`OrchestrationClient`].

mod client;
mod cloud;
mod deployment;
mod error;

pub use client::{FlowId, OrchestrationClient};
pub use cloud::{CloudClient, CloudConfig, DEFAULT_API_URL, idempotency_key};
pub use deployment::{DeploymentReport, ErrorPolicy, FailedFlow, FlowDeployment, RegisteredFlow};
pub use error::{DeployError, RegistrationError};
