use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("flow has no name")]
  MissingName,

  #[error("duplicate task id: {0}")]
  DuplicateTask(String),

  #[error("edge references unknown task: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("task dependencies contain a cycle through: {0}")]
  Cycle(String),

  #[error("failed to serialize flow: {0}")]
  Serialize(#[from] serde_json::Error),
}
