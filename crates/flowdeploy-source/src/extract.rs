use std::fs;
use std::path::Path;

use flowdeploy_config::FlowDocument;
use flowdeploy_flow::Flow;

use crate::error::ExtractError;

/// Load the file at `path` and return the single flow it defines.
///
/// A flow without a `name` is named after the file stem.
pub fn extract_flow(path: impl AsRef<Path>) -> Result<Flow, ExtractError> {
  let path = path.as_ref();

  let content = fs::read_to_string(path).map_err(|e| ExtractError::load(path, e))?;
  let document = parse_document(&content).map_err(|e| ExtractError::load(path, e))?;

  let mut flows = document.flows;
  if flows.len() > 1 {
    return Err(ExtractError::MultipleFlowsFound {
      path: path.to_path_buf(),
      count: flows.len(),
    });
  }
  let Some(mut def) = flows.pop() else {
    return Err(ExtractError::NoFlowFound {
      path: path.to_path_buf(),
    });
  };

  if def.name.is_none() {
    def.name = path
      .file_stem()
      .and_then(|s| s.to_str())
      .map(|s| s.to_string());
  }

  let mut flow = Flow::from_def(def).map_err(|e| ExtractError::load(path, e))?;
  flow.source = Some(path.to_path_buf());
  Ok(flow)
}

/// Parse a flow document. A file holding only comments defines no flows.
fn parse_document(content: &str) -> Result<FlowDocument, serde_yaml::Error> {
  let blank = content
    .lines()
    .map(str::trim)
    .all(|line| line.is_empty() || line.starts_with('#'));
  if blank {
    return Ok(FlowDocument::default());
  }
  serde_yaml::from_str(content)
}

#[cfg(test)]
mod tests {
  use super::*;

  const ONE_FLOW: &str = r#"
flows:
  - name: hello_world
    tasks:
      - task_id: log_versions
        type: log
        message: hello
"#;

  fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn test_extract_single_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "hello_world.yaml", ONE_FLOW);

    let flow = extract_flow(&path).unwrap();
    assert_eq!(flow.name, "hello_world");
    assert_eq!(flow.tasks.len(), 1);
    assert_eq!(flow.source.as_deref(), Some(path.as_path()));
    assert!(flow.storage.is_none());
    assert!(flow.run_config.is_none());
  }

  #[test]
  fn test_extract_names_flow_after_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "s3_download_flow.yaml",
      "flows:\n  - tasks:\n      - task_id: download\n        type: s3_download\n",
    );

    let flow = extract_flow(&path).unwrap();
    assert_eq!(flow.name, "s3_download_flow");
  }

  #[test]
  fn test_extract_no_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "empty.yaml", "flows: []\n");
    assert!(matches!(extract_flow(&path), Err(ExtractError::NoFlowFound { .. })));

    let path = write(dir.path(), "comments.yaml", "# nothing here yet\n\n");
    assert!(matches!(extract_flow(&path), Err(ExtractError::NoFlowFound { .. })));
  }

  #[test]
  fn test_extract_multiple_flows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "two.yaml",
      "flows:\n  - name: one\n    tasks: []\n  - name: two\n    tasks: []\n",
    );

    match extract_flow(&path) {
      Err(ExtractError::MultipleFlowsFound { count, .. }) => assert_eq!(count, 2),
      other => panic!("expected MultipleFlowsFound, got {:?}", other),
    }
  }

  #[test]
  fn test_extract_malformed_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "broken.yaml", "flows: [\n");

    let err = extract_flow(&path).unwrap_err();
    assert!(matches!(err, ExtractError::Load { .. }));
    assert_eq!(err.path(), path.as_path());
  }

  #[test]
  fn test_extract_invalid_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "bad_edge.yaml",
      "flows:\n  - name: bad\n    tasks: []\n    edges:\n      - { from: a, to: b }\n",
    );

    let err = extract_flow(&path).unwrap_err();
    assert!(err.to_string().contains("unknown task"), "{}", err);
  }

  #[test]
  fn test_extract_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_flow(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, ExtractError::Load { .. }));
  }
}
