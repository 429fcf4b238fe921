use flowdeploy_config::ClientOptions;
use serde::Deserialize;
use tracing::info;

use crate::aws::{AwsCredentials, resolve_region};
use crate::error::TaskError;
use crate::params::{non_empty, resolve};
use crate::sfn::{SfnClient, StartExecutionRequest, StepFunctions};

/// The three parameters of an activation.
///
/// Used both for the defaults stored on a [`StepActivate`] and for the
/// overrides passed when it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionParams {
  #[serde(default)]
  pub state_machine_arn: Option<String>,
  #[serde(default)]
  pub execution_name: Option<String>,
  #[serde(default)]
  pub execution_input: Option<String>,
}

impl ExecutionParams {
  /// Per field: the override if present, else the default, else unset.
  pub fn merge(overrides: ExecutionParams, defaults: &ExecutionParams) -> Self {
    Self {
      state_machine_arn: resolve(overrides.state_machine_arn, &defaults.state_machine_arn),
      execution_name: resolve(overrides.execution_name, &defaults.execution_name),
      execution_input: resolve(overrides.execution_input, &defaults.execution_input),
    }
  }
}

/// Starts an AWS Step Functions execution and returns the service response.
///
/// The task returns as soon as the execution has started. It does not wait
/// for the execution to finish.
#[derive(Debug, Clone, Default)]
pub struct StepActivate {
  defaults: ExecutionParams,
  client_options: ClientOptions,
}

impl StepActivate {
  pub fn new(defaults: ExecutionParams, client_options: ClientOptions) -> Self {
    Self {
      defaults,
      client_options,
    }
  }

  pub fn defaults(&self) -> &ExecutionParams {
    &self.defaults
  }

  /// Resolve the parameters for one run into a request.
  ///
  /// Fails with [`TaskError::InvalidArgument`] when no state machine ARN is
  /// available from either the overrides or the defaults.
  pub fn request(&self, overrides: ExecutionParams) -> Result<StartExecutionRequest, TaskError> {
    let params = ExecutionParams::merge(overrides, &self.defaults);

    let Some(state_machine_arn) = non_empty(&params.state_machine_arn) else {
      return Err(TaskError::InvalidArgument(
        "a state machine ARN must be provided".to_string(),
      ));
    };

    Ok(StartExecutionRequest {
      state_machine_arn: state_machine_arn.to_string(),
      name: params.execution_name,
      input: params.execution_input,
    })
  }

  /// Start the execution with a client built from `credentials`, or from the
  /// provider chain when none are passed.
  pub async fn run(
    &self,
    credentials: Option<&AwsCredentials>,
    overrides: ExecutionParams,
  ) -> Result<serde_json::Value, TaskError> {
    let request = self.request(overrides)?;

    let credentials = AwsCredentials::resolve(credentials).await?;
    let region = resolve_region(&self.client_options, Some(&request.state_machine_arn))?;
    let client = SfnClient::new(credentials, region, &self.client_options)?;

    start(&client, &request).await
  }

  /// Start the execution with an existing client.
  pub async fn run_with<S: StepFunctions + ?Sized>(
    &self,
    client: &S,
    overrides: ExecutionParams,
  ) -> Result<serde_json::Value, TaskError> {
    let request = self.request(overrides)?;
    start(client, &request).await
  }
}

async fn start<S: StepFunctions + ?Sized>(
  client: &S,
  request: &StartExecutionRequest,
) -> Result<serde_json::Value, TaskError> {
  let response = client.start_execution(request).await?;
  info!(
    state_machine_arn = %request.state_machine_arn,
    execution_arn = %response.get("executionArn").and_then(|a| a.as_str()).unwrap_or_default(),
    "execution started"
  );
  Ok(response)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn defaults() -> ExecutionParams {
    ExecutionParams {
      state_machine_arn: Some("arn:default".to_string()),
      execution_name: None,
      execution_input: Some(r#"{"Parameters": "{}"}"#.to_string()),
    }
  }

  #[test]
  fn test_merge_prefers_overrides() {
    let overrides = ExecutionParams {
      execution_name: Some("run-1".to_string()),
      state_machine_arn: Some("arn:override".to_string()),
      execution_input: None,
    };

    let merged = ExecutionParams::merge(overrides, &defaults());
    assert_eq!(merged.state_machine_arn.as_deref(), Some("arn:override"));
    assert_eq!(merged.execution_name.as_deref(), Some("run-1"));
    assert_eq!(merged.execution_input.as_deref(), Some(r#"{"Parameters": "{}"}"#));
  }

  #[test]
  fn test_request_without_arn() {
    let task = StepActivate::default();
    let err = task.request(ExecutionParams::default()).unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument(_)));
    assert!(err.to_string().contains("state machine ARN must be provided"));
  }

  #[test]
  fn test_request_with_empty_arn() {
    let task = StepActivate::new(
      ExecutionParams {
        state_machine_arn: Some(String::new()),
        ..Default::default()
      },
      ClientOptions::default(),
    );
    assert!(matches!(
      task.request(ExecutionParams::default()),
      Err(TaskError::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_empty_override_replaces_default() {
    // Presence decides precedence, so an empty value still wins.
    let task = StepActivate::new(defaults(), ClientOptions::default());
    let overrides = ExecutionParams {
      state_machine_arn: Some(String::new()),
      execution_name: Some(String::new()),
      ..Default::default()
    };

    let merged = ExecutionParams::merge(overrides.clone(), task.defaults());
    assert_eq!(merged.state_machine_arn.as_deref(), Some(""));
    assert_eq!(merged.execution_name.as_deref(), Some(""));
    assert!(matches!(
      task.request(overrides),
      Err(TaskError::InvalidArgument(_))
    ));
  }

  #[tokio::test]
  async fn test_run_without_arn_skips_client() {
    // Fails before any credential or region lookup.
    let task = StepActivate::default();
    let err = task.run(None, ExecutionParams::default()).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument(_)));
  }

  #[test]
  fn test_overrides_reject_unknown_fields() {
    let result: Result<ExecutionParams, _> =
      serde_json::from_value(serde_json::json!({"execution_nme": "typo"}));
    assert!(result.is_err());
  }
}
