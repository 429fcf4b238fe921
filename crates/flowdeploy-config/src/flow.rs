use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::task::TaskDef;

/// The top level of a flow definition file.
///
/// Keys other than `flows` are ignored so a document can carry shared YAML
/// anchors next to its flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
  #[serde(default)]
  pub flows: Vec<FlowDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  /// Defaults to the stem of the file the flow was loaded from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub tasks: Vec<TaskDef>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}
