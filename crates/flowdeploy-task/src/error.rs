use thiserror::Error;

/// Errors that can occur during task execution.
#[derive(Debug, Error)]
pub enum TaskError {
  /// Invalid input value.
  #[error("invalid input '{field}': {message}")]
  InvalidInput { field: String, message: String },

  /// A required parameter resolved to nothing. No external call was made.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// No credentials were passed and no provider in the chain had any.
  #[error("no AWS credentials provided and none found in the environment, container or instance metadata")]
  MissingCredentials,

  /// A credential provider was configured but returned something unusable.
  #[error("credential provider {provider} failed: {message}")]
  CredentialProvider { provider: String, message: String },

  /// Request signing failed.
  #[error("signing error: {0}")]
  Signing(String),

  /// No region could be determined for the client.
  #[error("no AWS region configured")]
  MissingRegion,

  /// HTTP request failed.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The remote service rejected the request.
  #[error("service error ({status}) {code}: {message}")]
  Service {
    status: u16,
    code: String,
    message: String,
  },

  /// Reading from object storage failed.
  #[error("storage error: {0}")]
  Storage(#[from] flowdeploy_storage::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl TaskError {
  pub fn invalid_input(field: impl Into<String>, message: impl ToString) -> Self {
    Self::InvalidInput {
      field: field.into(),
      message: message.to_string(),
    }
  }
}
