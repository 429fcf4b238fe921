use tracing::info;

const DEFAULT_MESSAGE: &str = concat!("flowdeploy-task version = ", env!("CARGO_PKG_VERSION"));

/// Logs a message and returns it as the task output.
#[derive(Debug, Clone, Default)]
pub struct Log {
  message: Option<String>,
}

impl Log {
  pub fn new(message: Option<String>) -> Self {
    Self { message }
  }

  pub fn run(&self, task_id: &str, message: Option<String>) -> serde_json::Value {
    let message = message
      .or_else(|| self.message.clone())
      .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
    info!(task_id = %task_id, "{}", message);
    serde_json::Value::String(message)
  }
}
