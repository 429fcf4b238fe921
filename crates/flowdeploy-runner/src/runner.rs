use std::collections::HashMap;
use std::time::Duration;

use flowdeploy_config::TaskDef;
use flowdeploy_flow::Flow;
use flowdeploy_task::{AwsCredentials, TaskContext};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::RunError;
use crate::executor::{DefaultExecutor, TaskExecutor};
use crate::input::{environment, render_inputs};

/// Lifecycle of a task within a flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
  Pending,
  Running,
  Succeeded,
  Failed,
}

/// Outcome of one task in a flow run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRun {
  pub task_id: String,
  pub state: TaskState,
  pub attempts: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Outcome of a flow run. Tasks appear in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct FlowRunResult {
  pub flow_run_id: String,
  pub flow_name: String,
  pub tasks: Vec<TaskRun>,
}

impl FlowRunResult {
  pub fn is_success(&self) -> bool {
    self.tasks.iter().all(|t| t.state == TaskState::Succeeded)
  }

  pub fn task(&self, task_id: &str) -> Option<&TaskRun> {
    self.tasks.iter().find(|t| t.task_id == task_id)
  }
}

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
  /// Credentials handed to AWS tasks. Tasks fall back to the environment.
  pub credentials: Option<AwsCredentials>,
}

/// Runs a flow's tasks one at a time in dependency order.
///
/// A task that still fails after its retries stops the run. Tasks after it
/// stay `Pending`.
pub struct FlowRunner<E: TaskExecutor = DefaultExecutor> {
  config: RunnerConfig,
  executor: E,
}

impl FlowRunner<DefaultExecutor> {
  pub fn new(config: RunnerConfig) -> Self {
    Self::with_executor(config, DefaultExecutor)
  }
}

impl<E: TaskExecutor> FlowRunner<E> {
  pub fn with_executor(config: RunnerConfig, executor: E) -> Self {
    Self { config, executor }
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  pub async fn run(&self, flow: &Flow, cancel: CancellationToken) -> Result<FlowRunResult, RunError> {
    let graph = flow.graph()?;
    let order = graph.topological_order()?;
    let flow_run_id = uuid::Uuid::new_v4().to_string();
    let env = environment();

    info!(flow = %flow.name, flow_run_id = %flow_run_id, tasks = order.len(), "flow run started");

    let mut runs: Vec<TaskRun> = order
      .iter()
      .map(|task_id| TaskRun {
        task_id: task_id.clone(),
        state: TaskState::Pending,
        attempts: 0,
        output: None,
        error: None,
      })
      .collect();
    let mut outputs: HashMap<&str, serde_json::Value> = HashMap::new();

    for (index, task_id) in order.iter().enumerate() {
      if cancel.is_cancelled() {
        return Err(RunError::Cancelled);
      }

      // Every id in the order comes from the flow's task list.
      let Some(task) = flow.get_task(task_id) else {
        continue;
      };

      let upstream: serde_json::Map<String, serde_json::Value> = graph
        .upstream(task_id)
        .iter()
        .filter_map(|id| outputs.get(id.as_str()).map(|o| (id.clone(), o.clone())))
        .collect();
      let context = json!({
        "flow": { "name": flow.name, "run_id": flow_run_id },
        "upstream": upstream,
      });

      let run = &mut runs[index];
      run.state = TaskState::Running;

      let inputs = match render_inputs(&env, &task.inputs, &context) {
        Ok(inputs) => inputs,
        Err(message) => {
          error!(task_id = %task_id, error = %message, "task input rendering failed");
          run.state = TaskState::Failed;
          run.error = Some(message);
          break;
        }
      };

      let ctx = TaskContext {
        flow_run_id: flow_run_id.clone(),
        task_id: task_id.clone(),
        inputs,
        credentials: self.config.credentials.clone(),
      };

      match self.run_with_retries(task, &ctx, run, &cancel).await? {
        Some(output) => {
          run.state = TaskState::Succeeded;
          run.output = Some(output.clone());
          outputs.insert(task_id.as_str(), output);
        }
        None => {
          run.state = TaskState::Failed;
          break;
        }
      }
    }

    let result = FlowRunResult {
      flow_run_id,
      flow_name: flow.name.clone(),
      tasks: runs,
    };
    if result.is_success() {
      info!(flow = %flow.name, flow_run_id = %result.flow_run_id, "flow run succeeded");
    } else {
      error!(flow = %flow.name, flow_run_id = %result.flow_run_id, "flow run failed");
    }
    Ok(result)
  }

  /// Returns the output, or `None` once every attempt has failed.
  async fn run_with_retries(
    &self,
    task: &TaskDef,
    ctx: &TaskContext,
    run: &mut TaskRun,
    cancel: &CancellationToken,
  ) -> Result<Option<serde_json::Value>, RunError> {
    let max_attempts = task.max_retries.unwrap_or(0).saturating_add(1);
    let delay = Duration::from_millis(task.retry_delay_ms.unwrap_or(0));

    loop {
      run.attempts += 1;
      let result = tokio::select! {
        result = self.executor.execute(task, ctx) => result,
        _ = cancel.cancelled() => return Err(RunError::Cancelled),
      };

      match result {
        Ok(output) => {
          info!(task_id = %ctx.task_id, attempts = run.attempts, "task succeeded");
          return Ok(Some(output.output));
        }
        Err(e) if run.attempts < max_attempts => {
          warn!(
            task_id = %ctx.task_id,
            attempt = run.attempts,
            max_attempts,
            error = %e,
            "task failed, retrying"
          );
          tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return Err(RunError::Cancelled),
          }
        }
        Err(e) => {
          error!(task_id = %ctx.task_id, attempts = run.attempts, error = %e, "task failed");
          run.error = Some(e.to_string());
          return Ok(None);
        }
      }
    }
  }
}
