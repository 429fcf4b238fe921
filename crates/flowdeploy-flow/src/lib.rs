//! Flowdeploy Flow
//!
//! This crate provides the validated flow representation. A [`Flow`] comes
//! either from a [`flowdeploy_config::FlowDef`] loaded out of a flow file or
//! from a [`FlowBuilder`] in code.
//!
//! Validation guarantees:
//! - Task ids are unique
//! - Every edge connects two known tasks
//! - Dependencies are acyclic

mod builder;
mod error;
mod flow;
mod graph;

pub use builder::FlowBuilder;
pub use error::FlowError;
pub use flow::Flow;
pub use graph::Graph;
