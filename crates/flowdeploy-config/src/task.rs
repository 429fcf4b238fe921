use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::input::InputValue;

/// Extra configuration forwarded to AWS clients built by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
  /// Region override. Falls back to the environment when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,

  /// Custom service endpoint, e.g. a local emulator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  pub task_id: String,
  #[serde(flatten)]
  pub kind: TaskKind,
  #[serde(default)]
  pub inputs: HashMap<String, InputValue>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_retries: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retry_delay_ms: Option<u64>,
}

impl TaskDef {
  pub fn new(task_id: impl Into<String>, kind: TaskKind) -> Self {
    Self {
      task_id: task_id.into(),
      kind,
      inputs: HashMap::new(),
      max_retries: None,
      retry_delay_ms: None,
    }
  }

  /// Add a call-time input template.
  pub fn with_input(mut self, name: impl Into<String>, template: impl Into<InputValue>) -> Self {
    self.inputs.insert(name.into(), template.into());
    self
  }

  pub fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
    self.max_retries = Some(max_retries);
    self.retry_delay_ms = Some(retry_delay_ms);
    self
  }
}

/// The kind of work a task performs, with its construction-time defaults.
///
/// Defaults stored here are overridden by rendered `inputs` of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
  /// Start an AWS Step Functions execution.
  StepActivate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state_machine_arn: Option<String>,
    /// Must be unique per state machine for 90 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_name: Option<String>,
    /// JSON document passed to the execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_input: Option<String>,
    #[serde(default)]
    client: ClientOptions,
  },

  /// Download a single object from S3.
  S3Download {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    /// Return raw bytes instead of UTF-8 text.
    #[serde(default)]
    as_bytes: bool,
    #[serde(default)]
    client: ClientOptions,
  },

  /// Emit a log line. Useful as a smoke test for a deployed image.
  Log {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
  },
}

impl TaskKind {
  /// Short type name, matching the serialized `type` tag.
  pub fn type_name(&self) -> &'static str {
    match self {
      TaskKind::StepActivate { .. } => "step_activate",
      TaskKind::S3Download { .. } => "s3_download",
      TaskKind::Log { .. } => "log",
    }
  }
}
