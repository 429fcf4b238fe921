use std::collections::{HashMap, VecDeque};

use flowdeploy_config::Edge;

use crate::error::FlowError;

/// Task dependency graph for traversal and validation.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Task ids in declaration order.
  order: Vec<String>,
  /// Adjacency list: task_id -> list of downstream task_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: task_id -> list of upstream task_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
  /// Build a graph from task ids and edges.
  ///
  /// Fails if an edge names a task that does not exist.
  pub fn new<'a>(
    task_ids: impl IntoIterator<Item = &'a str>,
    edges: &[Edge],
  ) -> Result<Self, FlowError> {
    let mut order = Vec::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for task_id in task_ids {
      if adjacency.contains_key(task_id) {
        return Err(FlowError::DuplicateTask(task_id.to_string()));
      }
      order.push(task_id.to_string());
      adjacency.insert(task_id.to_string(), Vec::new());
      reverse_adjacency.insert(task_id.to_string(), Vec::new());
    }

    for edge in edges {
      if !adjacency.contains_key(&edge.from) || !adjacency.contains_key(&edge.to) {
        return Err(FlowError::InvalidEdge {
          from: edge.from.clone(),
          to: edge.to.clone(),
        });
      }
      adjacency
        .entry(edge.from.clone())
        .or_default()
        .push(edge.to.clone());
      reverse_adjacency
        .entry(edge.to.clone())
        .or_default()
        .push(edge.from.clone());
    }

    Ok(Self {
      order,
      adjacency,
      reverse_adjacency,
    })
  }

  /// Tasks with no incoming edges, in declaration order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.upstream(id).is_empty())
      .map(|id| id.as_str())
      .collect()
  }

  /// Get downstream tasks for a given task.
  pub fn downstream(&self, task_id: &str) -> &[String] {
    self
      .adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream tasks for a given task.
  pub fn upstream(&self, task_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Order tasks so every task comes after all of its upstream tasks.
  ///
  /// Ties are broken by declaration order, so the result is stable.
  pub fn topological_order(&self) -> Result<Vec<String>, FlowError> {
    let mut remaining: HashMap<&str, usize> = self
      .order
      .iter()
      .map(|id| (id.as_str(), self.upstream(id).len()))
      .collect();
    let mut ready: VecDeque<&str> = self.entry_points().into_iter().collect();
    let mut sorted = Vec::with_capacity(self.order.len());

    while let Some(task_id) = ready.pop_front() {
      sorted.push(task_id.to_string());
      for next in self.downstream(task_id) {
        if let Some(count) = remaining.get_mut(next.as_str()) {
          *count -= 1;
          if *count == 0 {
            ready.push_back(next.as_str());
          }
        }
      }
    }

    if sorted.len() != self.order.len() {
      let stuck = self
        .order
        .iter()
        .find(|id| !sorted.contains(id))
        .cloned()
        .unwrap_or_default();
      return Err(FlowError::Cycle(stuck));
    }

    Ok(sorted)
  }
}
