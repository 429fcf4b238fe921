use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Run descriptor: how and where the orchestration agent executes a flow.
///
/// Same copy-before-bind rule as [`crate::StorageDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunConfigDef {
  /// Run as an ECS task.
  Ecs {
    /// Agent routing labels.
    #[serde(default)]
    labels: Vec<String>,
    /// Container image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_definition_arn: Option<String>,
    /// Inline task definition, as loaded from a task definition file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_definition: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
  },

  /// Run as a local process on the agent host.
  Local {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_dir: Option<PathBuf>,
  },
}

impl RunConfigDef {
  /// An ECS run config routed to agents carrying `labels`.
  pub fn ecs(labels: Vec<String>, image: Option<String>, task_definition_arn: Option<String>) -> Self {
    RunConfigDef::Ecs {
      labels,
      image,
      task_definition_arn,
      task_definition: None,
      env: BTreeMap::new(),
      cpu: None,
      memory: None,
    }
  }

  pub fn labels(&self) -> &[String] {
    match self {
      RunConfigDef::Ecs { labels, .. } | RunConfigDef::Local { labels, .. } => labels,
    }
  }
}
