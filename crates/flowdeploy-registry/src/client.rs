use std::fmt;

use async_trait::async_trait;
use flowdeploy_flow::Flow;
use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Identifier the orchestration service assigned to a registered flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl fmt::Display for FlowId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Client for the orchestration service flows are registered with.
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
  /// Build the flow's artifact and register the flow under `project_name`.
  ///
  /// The flow must already carry its storage and run descriptors.
  async fn register(&self, flow: &Flow, project_name: &str) -> Result<FlowId, RegistrationError>;
}
