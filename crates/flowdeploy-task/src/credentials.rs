//! Credential provider chain for tasks that receive no explicit credentials.
//!
//! Providers are tried in order:
//! 1. `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`.
//! 2. ECS container credentials from `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI`
//!    or `AWS_CONTAINER_CREDENTIALS_FULL_URI`, with the optional
//!    `AWS_CONTAINER_AUTHORIZATION_TOKEN`.
//! 3. The EC2 instance metadata service (IMDSv2), unless
//!    `AWS_EC2_METADATA_DISABLED=true`. `AWS_EC2_METADATA_SERVICE_ENDPOINT`
//!    overrides its address.
//!
//! A container provider that is configured but fails is an error. An
//! unreachable metadata service just means the chain is exhausted.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::aws::AwsCredentials;
use crate::error::TaskError;

const CONTAINER_ENDPOINT: &str = "http://169.254.170.2";
const IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_TTL_SECONDS: &str = "21600";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(2);

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials document served by both the container endpoint and IMDS.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProviderCredentials {
  access_key_id: String,
  secret_access_key: String,
  #[serde(default)]
  token: Option<String>,
}

impl From<ProviderCredentials> for AwsCredentials {
  fn from(c: ProviderCredentials) -> Self {
    Self {
      access_key: c.access_key_id,
      secret_access_key: c.secret_access_key,
      session_token: c.token.filter(|t| !t.is_empty()),
    }
  }
}

/// Resolves AWS credentials the way AWS SDKs do for a process running on
/// ECS or EC2.
#[derive(Clone)]
pub struct CredentialChain {
  lookup: Lookup,
  http: Client,
  container_endpoint: String,
}

impl CredentialChain {
  /// A chain reading the process environment.
  pub fn from_env() -> Self {
    Self::with_lookup(|name| std::env::var(name).ok())
  }

  /// A chain reading variables through `lookup` instead of the environment.
  pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
    let http = Client::builder()
      .timeout(PROVIDER_TIMEOUT)
      .build()
      .unwrap_or_default();
    Self {
      lookup: Arc::new(lookup),
      http,
      container_endpoint: CONTAINER_ENDPOINT.to_string(),
    }
  }

  /// Override the host `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI` is resolved against.
  pub fn with_container_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.container_endpoint = endpoint.into();
    self
  }

  fn var(&self, name: &str) -> Option<String> {
    (self.lookup)(name).filter(|v| !v.is_empty())
  }

  /// Explicit credentials win. Otherwise walk the provider chain.
  pub async fn resolve(&self, explicit: Option<&AwsCredentials>) -> Result<AwsCredentials, TaskError> {
    if let Some(credentials) = explicit {
      return Ok(credentials.clone());
    }
    if let Some(credentials) = AwsCredentials::from_lookup(|name| self.var(name)) {
      debug!(provider = "environment", "resolved AWS credentials");
      return Ok(credentials);
    }
    if let Some(credentials) = self.container_credentials().await? {
      debug!(provider = "container", "resolved AWS credentials");
      return Ok(credentials);
    }
    if let Some(credentials) = self.instance_metadata_credentials().await {
      debug!(provider = "instance_metadata", "resolved AWS credentials");
      return Ok(credentials);
    }
    Err(TaskError::MissingCredentials)
  }

  async fn container_credentials(&self) -> Result<Option<AwsCredentials>, TaskError> {
    let url = match (
      self.var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI"),
      self.var("AWS_CONTAINER_CREDENTIALS_FULL_URI"),
    ) {
      (Some(relative), _) => format!("{}{}", self.container_endpoint.trim_end_matches('/'), relative),
      (None, Some(full)) => full,
      (None, None) => return Ok(None),
    };

    let mut request = self.http.get(&url);
    if let Some(token) = self.var("AWS_CONTAINER_AUTHORIZATION_TOKEN") {
      request = request.header("Authorization", token);
    }

    let response = request.send().await?;
    let credentials: ProviderCredentials = json_body("container", response).await?;
    Ok(Some(credentials.into()))
  }

  async fn instance_metadata_credentials(&self) -> Option<AwsCredentials> {
    if self
      .var("AWS_EC2_METADATA_DISABLED")
      .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
      return None;
    }
    let endpoint = self
      .var("AWS_EC2_METADATA_SERVICE_ENDPOINT")
      .unwrap_or_else(|| IMDS_ENDPOINT.to_string());
    let endpoint = endpoint.trim_end_matches('/');

    match self.query_instance_metadata(endpoint).await {
      Ok(credentials) => credentials,
      Err(e) => {
        debug!(endpoint = %endpoint, error = %e, "instance metadata unavailable");
        None
      }
    }
  }

  async fn query_instance_metadata(&self, endpoint: &str) -> Result<Option<AwsCredentials>, TaskError> {
    let response = self
      .http
      .put(format!("{}/latest/api/token", endpoint))
      .header("X-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECONDS)
      .send()
      .await?;
    if !response.status().is_success() {
      return Ok(None);
    }
    let token = response.text().await?;

    let roles_url = format!("{}/latest/meta-data/iam/security-credentials/", endpoint);
    let response = self
      .http
      .get(&roles_url)
      .header("X-aws-ec2-metadata-token", &token)
      .send()
      .await?;
    if !response.status().is_success() {
      return Ok(None);
    }
    let roles = response.text().await?;
    let Some(role) = roles.lines().map(str::trim).find(|l| !l.is_empty()) else {
      return Ok(None);
    };

    let response = self
      .http
      .get(format!("{}{}", roles_url, role))
      .header("X-aws-ec2-metadata-token", &token)
      .send()
      .await?;
    let credentials: ProviderCredentials = json_body("instance_metadata", response).await?;
    Ok(Some(credentials.into()))
  }
}

async fn json_body(provider: &str, response: Response) -> Result<ProviderCredentials, TaskError> {
  let status = response.status();
  let body = response.text().await?;
  if !status.is_success() {
    return Err(TaskError::CredentialProvider {
      provider: provider.to_string(),
      message: format!("status {}: {}", status.as_u16(), body),
    });
  }
  serde_json::from_str(&body).map_err(|e| TaskError::CredentialProvider {
    provider: provider.to_string(),
    message: e.to_string(),
  })
}
