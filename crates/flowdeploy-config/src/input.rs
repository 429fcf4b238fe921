//! Task input values.
//!
//! Every input is a minijinja template rendered right before the task runs.
//! The render context exposes the flow name, the outputs of upstream tasks
//! keyed by task id, and a `uuid()` function for one-off tokens:
//!
//! ```yaml
//! inputs:
//!   execution_name: "{{ uuid() }}"
//!   key: "{{ upstream.list_objects.key }}"
//! ```
//!
//! A rendered input overrides the matching default configured on the task.

/// An input value is a template string that gets resolved at runtime.
pub type InputValue = String;
