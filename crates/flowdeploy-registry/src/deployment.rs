use std::path::{Path, PathBuf};

use flowdeploy_config::{RunConfigDef, StorageDef};
use flowdeploy_flow::Flow;
use flowdeploy_source::{SourceFilter, discover, extract_flow};
use serde::Serialize;
use tracing::{error, info};

use crate::client::{FlowId, OrchestrationClient};
use crate::error::DeployError;

/// What to do when one flow fails to register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
  /// Stop at the first failure and return its error.
  #[default]
  FailFast,
  /// Record the failure and move on to the next file.
  ContinueOnError,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredFlow {
  pub path: PathBuf,
  pub flow_name: String,
  pub flow_id: FlowId,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFlow {
  pub path: PathBuf,
  pub error: String,
}

/// Outcome of a bulk registration, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentReport {
  pub registered: Vec<RegisteredFlow>,
  pub failed: Vec<FailedFlow>,
}

impl DeploymentReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Registers every flow under a directory with one project, storage
/// descriptor and run configuration.
///
/// The descriptors are templates: each flow gets its own copy, so nothing
/// bound to one flow is visible through another.
pub struct FlowDeployment<C> {
  project_name: String,
  storage: StorageDef,
  run_config: RunConfigDef,
  client: C,
  filter: SourceFilter,
  error_policy: ErrorPolicy,
}

impl<C: OrchestrationClient> FlowDeployment<C> {
  pub fn new(
    project_name: impl Into<String>,
    storage: StorageDef,
    run_config: RunConfigDef,
    client: C,
  ) -> Self {
    Self {
      project_name: project_name.into(),
      storage,
      run_config,
      client,
      filter: SourceFilter::default(),
      error_policy: ErrorPolicy::default(),
    }
  }

  pub fn with_filter(mut self, filter: SourceFilter) -> Self {
    self.filter = filter;
    self
  }

  pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
    self.error_policy = policy;
    self
  }

  pub fn project_name(&self) -> &str {
    &self.project_name
  }

  pub fn storage(&self) -> &StorageDef {
    &self.storage
  }

  pub fn run_config(&self) -> &RunConfigDef {
    &self.run_config
  }

  pub fn client(&self) -> &C {
    &self.client
  }

  /// Extract the flow in `path` and bind fresh copies of the descriptors.
  pub fn prepare_flow(&self, path: impl AsRef<Path>) -> Result<Flow, DeployError> {
    let mut flow = extract_flow(path.as_ref())?;
    flow.storage = Some(self.storage.clone());
    flow.run_config = Some(self.run_config.clone());
    Ok(flow)
  }

  /// Register the single flow defined in `path`.
  pub async fn register_flow(&self, path: impl AsRef<Path>) -> Result<FlowId, DeployError> {
    self.register_prepared(path.as_ref()).await.map(|(_, id)| id)
  }

  async fn register_prepared(&self, path: &Path) -> Result<(String, FlowId), DeployError> {
    let flow = self.prepare_flow(path)?;
    let flow_id = self
      .client
      .register(&flow, &self.project_name)
      .await
      .map_err(|source| DeployError::Register {
        path: path.to_path_buf(),
        source,
      })?;
    Ok((flow.name, flow_id))
  }

  /// Discover every flow file under `flows_path` and register each in turn.
  pub async fn register_all_flows(
    &self,
    flows_path: impl AsRef<Path>,
  ) -> Result<DeploymentReport, DeployError> {
    let flows_path = flows_path.as_ref();
    let files = discover(flows_path, &self.filter)?;
    let mut report = DeploymentReport::default();

    info!(
      root = %flows_path.display(),
      project = %self.project_name,
      "registering flows"
    );

    for path in files {
      info!(path = %path.display(), "registering flow");
      match self.register_prepared(&path).await {
        Ok((flow_name, flow_id)) => {
          info!(path = %path.display(), flow = %flow_name, flow_id = %flow_id, "flow registered");
          report.registered.push(RegisteredFlow {
            path,
            flow_name,
            flow_id,
          });
        }
        Err(e) if self.error_policy == ErrorPolicy::ContinueOnError => {
          error!(path = %path.display(), error = %e, "flow registration failed");
          report.failed.push(FailedFlow {
            path,
            error: e.to_string(),
          });
        }
        Err(e) => return Err(e),
      }
    }

    info!(
      registered = report.registered.len(),
      failed = report.failed.len(),
      "registration finished"
    );
    Ok(report)
  }
}
