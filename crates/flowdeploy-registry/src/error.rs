use std::path::PathBuf;

use flowdeploy_source::{DiscoveryError, ExtractError};
use thiserror::Error;

/// Errors raised by the orchestration service client.
#[derive(Debug, Error)]
pub enum RegistrationError {
  /// HTTP request failed.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-success status and no GraphQL errors.
  #[error("unexpected status {status}: {body}")]
  Status { status: u16, body: String },

  /// The service rejected the request.
  #[error("rejected by orchestration service: {0}")]
  Rejected(String),

  /// No project with this name exists.
  #[error("project not found: {0}")]
  ProjectNotFound(String),

  #[error("invalid response: {0}")]
  InvalidResponse(String),

  /// Building or uploading the flow artifact failed.
  #[error("failed to store flow artifact: {0}")]
  Storage(#[from] flowdeploy_storage::Error),

  #[error("failed to serialize flow: {0}")]
  Serialize(#[from] flowdeploy_flow::FlowError),
}

/// Errors raised by the registration pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
  #[error(transparent)]
  Discovery(#[from] DiscoveryError),

  #[error(transparent)]
  Extract(#[from] ExtractError),

  #[error("failed to register {}: {source}", .path.display())]
  Register {
    path: PathBuf,
    #[source]
    source: RegistrationError,
  },
}
