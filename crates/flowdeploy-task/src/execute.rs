use serde::de::DeserializeOwned;

use crate::error::TaskError;
use crate::types::{Task, TaskContext, TaskOutput};

/// Execute a task.
///
/// Routes to the appropriate implementation based on task type. The context
/// inputs are the call-time overrides for that task's parameters.
pub async fn execute(task: &Task, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
  let output = match task {
    Task::StepActivate(task) => {
      task
        .run(ctx.credentials.as_ref(), parse_inputs(ctx)?)
        .await?
    }
    Task::S3Download(task) => {
      task
        .run(ctx.credentials.as_ref(), parse_inputs(ctx)?)
        .await?
    }
    Task::Log(task) => {
      let message = ctx
        .inputs
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string());
      task.run(&ctx.task_id, message)
    }
  };

  Ok(TaskOutput { output })
}

fn parse_inputs<T: DeserializeOwned + Default>(ctx: &TaskContext) -> Result<T, TaskError> {
  if ctx.inputs.is_null() {
    return Ok(T::default());
  }
  serde_json::from_value(ctx.inputs.clone()).map_err(|e| TaskError::invalid_input("inputs", e))
}
