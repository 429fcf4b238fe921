//! Task input rendering.
//!
//! Every input value is a minijinja template rendered against:
//! ```json
//! { "flow": { "name": "...", "run_id": "..." }, "upstream": { "<task_id>": <output> } }
//! ```
//! `upstream` holds the outputs of the task's direct upstream tasks. The
//! `uuid()` function returns a fresh v4 UUID on every call.

use std::collections::HashMap;

use minijinja::{Environment, Value};

pub(crate) fn environment() -> Environment<'static> {
  let mut env = Environment::new();
  env.add_function("uuid", || uuid::Uuid::new_v4().to_string());
  env
}

/// Render each input template. The result is a JSON object of strings.
pub(crate) fn render_inputs(
  env: &Environment,
  inputs: &HashMap<String, String>,
  context: &serde_json::Value,
) -> Result<serde_json::Value, String> {
  if inputs.is_empty() {
    return Ok(serde_json::Value::Null);
  }

  let context = Value::from_serialize(context);
  let mut rendered = serde_json::Map::new();
  for (key, template) in inputs {
    let value = env
      .render_str(template, context.clone())
      .map_err(|e| format!("failed to render input '{}': {}", key, e))?;
    rendered.insert(key.clone(), serde_json::Value::String(value));
  }
  Ok(serde_json::Value::Object(rendered))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_render_against_upstream() {
    let env = environment();
    let context = json!({ "flow": { "name": "demo" }, "upstream": { "fetch": { "id": 7 } } });

    let rendered = render_inputs(
      &env,
      &inputs(&[("message", "{{ flow.name }} got {{ upstream.fetch.id }}")]),
      &context,
    )
    .unwrap();

    assert_eq!(rendered, json!({ "message": "demo got 7" }));
  }

  #[test]
  fn test_no_inputs_renders_null() {
    let rendered = render_inputs(&environment(), &HashMap::new(), &json!({})).unwrap();
    assert!(rendered.is_null());
  }

  #[test]
  fn test_uuid_is_fresh_per_call() {
    let env = environment();
    let rendered = render_inputs(
      &env,
      &inputs(&[("a", "{{ uuid() }}"), ("b", "{{ uuid() }}")]),
      &json!({}),
    )
    .unwrap();

    let a = rendered["a"].as_str().unwrap();
    let b = rendered["b"].as_str().unwrap();
    assert_eq!(a.len(), 36);
    assert_ne!(a, b);
  }

  #[test]
  fn test_bad_template_reports_input() {
    let err = render_inputs(&environment(), &inputs(&[("x", "{{ unclosed")]), &json!({}))
      .unwrap_err();
    assert!(err.contains("'x'"));
  }
}
