//! AWS credential and region resolution.
//!
//! Explicitly passed credentials win. Otherwise the provider chain in
//! [`crate::credentials`] is walked. Regions come from the client options,
//! then `AWS_REGION`, then `AWS_DEFAULT_REGION`, then the region field of the
//! resource ARN being called. Empty values are skipped.

use std::fmt;

use flowdeploy_config::ClientOptions;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialChain;
use crate::error::TaskError;

/// AWS credentials, usually passed in from a secret.
///
/// The JSON form uses the `ACCESS_KEY` / `SECRET_ACCESS_KEY` keys:
/// ```json
/// { "ACCESS_KEY": "AKIA...", "SECRET_ACCESS_KEY": "..." }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
  #[serde(rename = "ACCESS_KEY")]
  pub access_key: String,
  #[serde(rename = "SECRET_ACCESS_KEY")]
  pub secret_access_key: String,
  #[serde(
    rename = "SESSION_TOKEN",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AwsCredentials")
      .field("access_key", &self.access_key)
      .field("secret_access_key", &"<redacted>")
      .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}

impl AwsCredentials {
  pub fn new(access_key: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
    Self {
      access_key: access_key.into(),
      secret_access_key: secret_access_key.into(),
      session_token: None,
    }
  }

  /// Read the static key variables from the process environment.
  pub fn from_env() -> Option<Self> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
    let access_key = lookup("AWS_ACCESS_KEY_ID").filter(|v| !v.is_empty())?;
    let secret_access_key = lookup("AWS_SECRET_ACCESS_KEY").filter(|v| !v.is_empty())?;
    Some(Self {
      access_key,
      secret_access_key,
      session_token: lookup("AWS_SESSION_TOKEN").filter(|v| !v.is_empty()),
    })
  }

  /// Resolve the credentials a client should sign with.
  pub async fn resolve(explicit: Option<&AwsCredentials>) -> Result<Self, TaskError> {
    CredentialChain::from_env().resolve(explicit).await
  }
}

/// Resolve the region a client should talk to.
pub fn resolve_region(options: &ClientOptions, arn: Option<&str>) -> Result<String, TaskError> {
  resolve_region_with(options, arn, |name| std::env::var(name).ok())
}

pub(crate) fn resolve_region_with(
  options: &ClientOptions,
  arn: Option<&str>,
  lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, TaskError> {
  let non_empty = |value: Option<String>| value.filter(|r| !r.is_empty());
  non_empty(options.region.clone())
    .or_else(|| non_empty(lookup("AWS_REGION")))
    .or_else(|| non_empty(lookup("AWS_DEFAULT_REGION")))
    .or_else(|| arn.and_then(region_from_arn))
    .ok_or(TaskError::MissingRegion)
}

/// `arn:partition:service:region:account:resource` -> `region`
fn region_from_arn(arn: &str) -> Option<String> {
  let mut parts = arn.split(':');
  if parts.next()? != "arn" {
    return None;
  }
  parts
    .nth(2)
    .filter(|region| !region.is_empty())
    .map(|region| region.to_string())
}
