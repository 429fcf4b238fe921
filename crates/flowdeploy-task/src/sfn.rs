//! AWS Step Functions client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use flowdeploy_config::ClientOptions;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::aws::AwsCredentials;
use crate::error::TaskError;
use crate::sigv4::{SigningParams, sign};

const SERVICE: &str = "states";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Parameters of a `StartExecution` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartExecutionRequest {
  #[serde(rename = "stateMachineArn")]
  pub state_machine_arn: String,
  /// Unique per state machine, account and region for 90 days.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// JSON input for the execution. The service defaults it to `{}`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub input: Option<String>,
}

/// The subset of the Step Functions API used by tasks.
#[async_trait]
pub trait StepFunctions: Send + Sync {
  /// Start an execution and return the raw service response, e.g.
  /// `{"executionArn": "...", "startDate": 1.6e9}`.
  async fn start_execution(
    &self,
    request: &StartExecutionRequest,
  ) -> Result<serde_json::Value, TaskError>;
}

/// Step Functions over the AWS JSON 1.0 protocol.
pub struct SfnClient {
  http: Client,
  endpoint: Url,
  region: String,
  credentials: AwsCredentials,
}

impl SfnClient {
  pub fn new(
    credentials: AwsCredentials,
    region: impl Into<String>,
    options: &ClientOptions,
  ) -> Result<Self, TaskError> {
    let region = region.into();
    let endpoint = match &options.endpoint_url {
      Some(endpoint) => endpoint.clone(),
      None => format!("https://{}.{}.amazonaws.com/", SERVICE, region),
    };
    let endpoint =
      Url::parse(&endpoint).map_err(|e| TaskError::invalid_input("endpoint_url", e))?;

    Ok(Self {
      http: Client::new(),
      endpoint,
      region,
      credentials,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// Invoke an operation, e.g. `AWSStepFunctions.StartExecution`.
  async fn call(
    &self,
    target: &str,
    body: &serde_json::Value,
  ) -> Result<serde_json::Value, TaskError> {
    let payload = serde_json::to_vec(body)?;

    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), CONTENT_TYPE.to_string());
    headers.insert("x-amz-target".to_string(), target.to_string());
    let params = SigningParams {
      credentials: &self.credentials,
      region: &self.region,
      service: SERVICE,
      time: Utc::now(),
    };
    sign(&params, "POST", &self.endpoint, &mut headers, &payload)?;

    debug!(target = %target, endpoint = %self.endpoint, "calling step functions");

    let mut request = self.http.post(self.endpoint.clone());
    for (name, value) in &headers {
      // reqwest derives Host from the URL.
      if name != "host" {
        request = request.header(name.as_str(), value.as_str());
      }
    }

    let response = request.body(payload).send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      return Err(service_error(status.as_u16(), &text));
    }

    if text.trim().is_empty() {
      return Ok(serde_json::json!({}));
    }
    Ok(serde_json::from_str(&text)?)
  }
}

#[async_trait]
impl StepFunctions for SfnClient {
  async fn start_execution(
    &self,
    request: &StartExecutionRequest,
  ) -> Result<serde_json::Value, TaskError> {
    let body = serde_json::to_value(request)?;
    self.call("AWSStepFunctions.StartExecution", &body).await
  }
}

/// Turn an AWS JSON error body into a [`TaskError::Service`].
///
/// `{"__type": "com.amazonaws.swf.base.model#ExecutionAlreadyExists", "message": "..."}`
fn service_error(status: u16, body: &str) -> TaskError {
  let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
  let code = parsed
    .get("__type")
    .and_then(|t| t.as_str())
    .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
    .unwrap_or_else(|| "Unknown".to_string());
  let message = parsed
    .get("message")
    .or_else(|| parsed.get("Message"))
    .and_then(|m| m.as_str())
    .map(|m| m.to_string())
    .unwrap_or_else(|| body.to_string());

  TaskError::Service {
    status,
    code,
    message,
  }
}
