use flowdeploy_config::TaskKind;
use serde::{Deserialize, Serialize};

use crate::aws::AwsCredentials;
use crate::log::Log;
use crate::s3_download::S3Download;
use crate::step_activate::{ExecutionParams, StepActivate};

/// A task to be executed, derived from a task definition.
#[derive(Debug, Clone)]
pub enum Task {
  StepActivate(StepActivate),
  S3Download(S3Download),
  Log(Log),
}

impl From<&TaskKind> for Task {
  fn from(kind: &TaskKind) -> Self {
    match kind {
      TaskKind::StepActivate {
        state_machine_arn,
        execution_name,
        execution_input,
        client,
      } => Task::StepActivate(StepActivate::new(
        ExecutionParams {
          state_machine_arn: state_machine_arn.clone(),
          execution_name: execution_name.clone(),
          execution_input: execution_input.clone(),
        },
        client.clone(),
      )),
      TaskKind::S3Download {
        bucket,
        key,
        as_bytes,
        client,
      } => Task::S3Download(S3Download::new(
        bucket.clone(),
        key.clone(),
        *as_bytes,
        client.clone(),
      )),
      TaskKind::Log { message } => Task::Log(Log::new(message.clone())),
    }
  }
}

/// Context provided to a task during execution.
#[derive(Debug, Clone)]
pub struct TaskContext {
  /// Flow run ID.
  pub flow_run_id: String,

  /// Task ID within the flow.
  pub task_id: String,

  /// Rendered call-time inputs, a JSON object of strings.
  pub inputs: serde_json::Value,

  /// Credentials for tasks that call AWS. Falls back to the environment.
  pub credentials: Option<AwsCredentials>,
}

/// Output produced by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
  /// The task's output data, passed through unchanged.
  pub output: serde_json::Value,
}
