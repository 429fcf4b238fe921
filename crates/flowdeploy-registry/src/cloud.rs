use async_trait::async_trait;
use flowdeploy_flow::Flow;
use flowdeploy_storage::build_flow_artifact;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::client::{FlowId, OrchestrationClient};
use crate::error::RegistrationError;

pub const DEFAULT_API_URL: &str = "https://api.prefect.io";

const PROJECT_QUERY: &str =
  r#"query($name: String!) { project(where: { name: { _eq: $name } }) { id } }"#;

const CREATE_FLOW_MUTATION: &str =
  r#"mutation($input: create_flow_input!) { create_flow(input: $input) { id } }"#;

/// Connection settings for the orchestration service's GraphQL API.
#[derive(Debug, Clone)]
pub struct CloudConfig {
  pub api_url: String,
  pub api_key: Option<String>,
}

impl Default for CloudConfig {
  fn default() -> Self {
    Self {
      api_url: DEFAULT_API_URL.to_string(),
      api_key: None,
    }
  }
}

/// GraphQL client for the orchestration service.
pub struct CloudClient {
  http: Client,
  config: CloudConfig,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
  #[serde(default)]
  data: Option<Value>,
  #[serde(default)]
  errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
  message: String,
}

impl GraphqlResponse {
  fn into_data(self) -> Result<Value, RegistrationError> {
    if !self.errors.is_empty() {
      let messages: Vec<_> = self.errors.into_iter().map(|e| e.message).collect();
      return Err(RegistrationError::Rejected(messages.join("; ")));
    }
    self
      .data
      .ok_or_else(|| RegistrationError::InvalidResponse("response has no data".to_string()))
  }
}

impl CloudClient {
  pub fn new(config: CloudConfig) -> Self {
    Self {
      http: Client::new(),
      config,
    }
  }

  pub fn config(&self) -> &CloudConfig {
    &self.config
  }

  async fn graphql(&self, query: &str, variables: Value) -> Result<Value, RegistrationError> {
    let mut request = self
      .http
      .post(&self.config.api_url)
      .json(&json!({ "query": query, "variables": variables }));
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    let parsed = serde_json::from_str::<GraphqlResponse>(&body);
    if !status.is_success() {
      return match parsed {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.into_data(),
        _ => Err(RegistrationError::Status {
          status: status.as_u16(),
          body,
        }),
      };
    }
    parsed
      .map_err(|e| RegistrationError::InvalidResponse(e.to_string()))?
      .into_data()
  }

  async fn project_id(&self, project_name: &str) -> Result<String, RegistrationError> {
    let data = self
      .graphql(PROJECT_QUERY, json!({ "name": project_name }))
      .await?;
    project_id_from(&data).ok_or_else(|| RegistrationError::ProjectNotFound(project_name.to_string()))
  }
}

fn project_id_from(data: &Value) -> Option<String> {
  data
    .get("project")?
    .as_array()?
    .first()?
    .get("id")?
    .as_str()
    .map(str::to_string)
}

/// Content hash of a flow, used so re-registering an unchanged flow does
/// not create a new version.
pub fn idempotency_key(flow: &Flow) -> Result<String, RegistrationError> {
  let bytes = flow.to_bytes()?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

#[async_trait]
impl OrchestrationClient for CloudClient {
  async fn register(&self, flow: &Flow, project_name: &str) -> Result<FlowId, RegistrationError> {
    // Hash before the build so the generated storage key does not leak in.
    let idempotency_key = idempotency_key(flow)?;
    // An unknown project must fail before anything is uploaded.
    let project_id = self.project_id(project_name).await?;
    let stored = build_flow_artifact(flow).await?;

    let mut registered = flow.clone();
    registered.storage = Some(stored.storage);
    let serialized = serde_json::to_value(&registered).map_err(flowdeploy_flow::FlowError::from)?;
    debug!(flow = %flow.name, project_id = %project_id, "creating flow");

    let data = self
      .graphql(
        CREATE_FLOW_MUTATION,
        json!({
          "input": {
            "project_id": project_id,
            "serialized_flow": serialized,
            "idempotency_key": idempotency_key,
            "set_schedule_active": true,
          }
        }),
      )
      .await?;

    let id = data
      .pointer("/create_flow/id")
      .and_then(Value::as_str)
      .ok_or_else(|| RegistrationError::InvalidResponse("create_flow returned no id".to_string()))?;

    info!(flow = %flow.name, flow_id = %id, location = %stored.location, "flow registered");
    Ok(FlowId(id.to_string()))
  }
}
