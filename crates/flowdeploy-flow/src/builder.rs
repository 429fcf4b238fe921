use flowdeploy_config::{Edge, FlowDef, TaskDef};

use crate::error::FlowError;
use crate::flow::Flow;

/// Builds a [`Flow`] in code.
///
/// ```
/// use flowdeploy_config::{TaskDef, TaskKind};
/// use flowdeploy_flow::Flow;
///
/// let flow = Flow::builder("hello_world")
///   .task(TaskDef::new("hello", TaskKind::Log { message: Some("hi".into()) }))
///   .build()
///   .unwrap();
/// assert_eq!(flow.tasks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FlowBuilder {
  def: FlowDef,
}

impl FlowBuilder {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      def: FlowDef {
        name: Some(name.into()),
        description: None,
        tasks: Vec::new(),
        edges: Vec::new(),
      },
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.def.description = Some(description.into());
    self
  }

  pub fn task(mut self, task: TaskDef) -> Self {
    self.def.tasks.push(task);
    self
  }

  /// Make `to` depend on `from`.
  pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
    self.def.edges.push(Edge::new(from, to));
    self
  }

  pub fn build(self) -> Result<Flow, FlowError> {
    Flow::from_def(self.def)
  }
}
