//! Flowdeploy Config
//!
//! This crate contains the serializable types for flowdeploy: flow definitions
//! as they appear in flow files, and the two deployment descriptors attached
//! to a flow when it is registered.
//!
//! - [`FlowDocument`] / [`FlowDef`] / [`TaskDef`]: the contents of a flow file
//! - [`StorageDef`]: where the packaged flow is stored
//! - [`RunConfigDef`]: how and where the flow executes
//!
//! Flow files are YAML (JSON is accepted too). `flowdeploy-flow` validates a
//! [`FlowDef`] into a runnable flow.

mod edge;
mod flow;
mod input;
mod run_config;
mod storage;
mod task;

pub use edge::Edge;
pub use flow::{FlowDef, FlowDocument};
pub use input::InputValue;
pub use run_config::RunConfigDef;
pub use storage::StorageDef;
pub use task::{ClientOptions, TaskDef, TaskKind};
