use std::path::PathBuf;

use flowdeploy_config::{Edge, FlowDef, RunConfigDef, StorageDef, TaskDef};
use serde::{Deserialize, Serialize};

use crate::builder::FlowBuilder;
use crate::error::FlowError;
use crate::graph::Graph;

/// A validated flow.
///
/// `storage` and `run_config` start out empty. The registration pipeline fills
/// them with per-flow copies of its descriptors right before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub tasks: Vec<TaskDef>,
  pub edges: Vec<Edge>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub storage: Option<StorageDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run_config: Option<RunConfigDef>,
  /// File the flow was extracted from, if any.
  #[serde(skip)]
  pub source: Option<PathBuf>,
}

impl Flow {
  /// Start building a flow in code.
  pub fn builder(name: impl Into<String>) -> FlowBuilder {
    FlowBuilder::new(name)
  }

  /// Validate a definition into a flow.
  pub fn from_def(def: FlowDef) -> Result<Self, FlowError> {
    let name = def
      .name
      .filter(|n| !n.trim().is_empty())
      .ok_or(FlowError::MissingName)?;

    let graph = Graph::new(def.tasks.iter().map(|t| t.task_id.as_str()), &def.edges)?;
    graph.topological_order()?;

    Ok(Self {
      name,
      description: def.description,
      tasks: def.tasks,
      edges: def.edges,
      storage: None,
      run_config: None,
      source: None,
    })
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Result<Graph, FlowError> {
    Graph::new(self.tasks.iter().map(|t| t.task_id.as_str()), &self.edges)
  }

  /// Get a task by ID.
  pub fn get_task(&self, task_id: &str) -> Option<&TaskDef> {
    self.tasks.iter().find(|t| t.task_id == task_id)
  }

  /// URL and path safe form of the flow name.
  ///
  /// Example: "Step Function Flow" -> "step-function-flow"
  pub fn slug(&self) -> String {
    let mut slug = String::with_capacity(self.name.len());
    for c in self.name.chars() {
      if c.is_ascii_alphanumeric() {
        slug.push(c.to_ascii_lowercase());
      } else if !slug.ends_with('-') {
        slug.push('-');
      }
    }
    slug.trim_matches('-').to_string()
  }

  /// Serialize the flow as the JSON artifact that gets stored and registered.
  pub fn to_bytes(&self) -> Result<Vec<u8>, FlowError> {
    Ok(serde_json::to_vec(self)?)
  }
}

#[cfg(test)]
mod tests {
  use flowdeploy_config::TaskKind;

  use super::*;

  fn log_task(id: &str) -> TaskDef {
    TaskDef::new(id, TaskKind::Log { message: None })
  }

  #[test]
  fn test_from_def_requires_name() {
    let def = FlowDef {
      name: None,
      description: None,
      tasks: vec![],
      edges: vec![],
    };
    assert!(matches!(Flow::from_def(def), Err(FlowError::MissingName)));
  }

  #[test]
  fn test_from_def_rejects_cycles() {
    let def = FlowDef {
      name: Some("cyclic".to_string()),
      description: None,
      tasks: vec![log_task("a"), log_task("b")],
      edges: vec![Edge::new("a", "b"), Edge::new("b", "a")],
    };
    assert!(matches!(Flow::from_def(def), Err(FlowError::Cycle(_))));
  }

  #[test]
  fn test_slug() {
    let flow = Flow::builder("Step Function  Flow!").build().unwrap();
    assert_eq!(flow.slug(), "step-function-flow");

    let flow = Flow::builder("hello_world").build().unwrap();
    assert_eq!(flow.slug(), "hello-world");
  }

  #[test]
  fn test_serialized_artifact_carries_descriptors() {
    let mut flow = Flow::builder("hello_world").task(log_task("hello")).build().unwrap();
    flow.storage = Some(StorageDef::s3("flows"));
    flow.source = Some(PathBuf::from("/tmp/hello_world.yaml"));

    let json: serde_json::Value = serde_json::from_slice(&flow.to_bytes().unwrap()).unwrap();
    assert_eq!(json["name"], "hello_world");
    assert_eq!(json["storage"]["bucket"], "flows");
    assert!(json.get("run_config").is_none());
    assert!(json.get("source").is_none());
  }
}
