use async_trait::async_trait;
use flowdeploy_config::TaskDef;
use flowdeploy_task::{Task, TaskContext, TaskError, TaskOutput, execute};

/// Runs a single task attempt.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
  async fn execute(&self, task: &TaskDef, ctx: &TaskContext) -> Result<TaskOutput, TaskError>;
}

/// Executes tasks with the built-in task implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExecutor;

#[async_trait]
impl TaskExecutor for DefaultExecutor {
  async fn execute(&self, task: &TaskDef, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    execute(&Task::from(&task.kind), ctx).await
  }
}
