use flowdeploy_flow::FlowError;
use thiserror::Error;

/// Errors that stop a flow run before or between tasks.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("invalid flow: {0}")]
  InvalidFlow(#[from] FlowError),

  #[error("flow run cancelled")]
  Cancelled,
}
