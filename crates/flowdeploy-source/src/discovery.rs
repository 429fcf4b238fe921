use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::DiscoveryError;

/// Which files count as flow files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
  /// File extension without the leading dot.
  pub extension: String,
  /// Per-directory file name that never holds a flow.
  pub initializer: String,
}

impl Default for SourceFilter {
  fn default() -> Self {
    Self {
      extension: "yaml".to_string(),
      initializer: "mod.yaml".to_string(),
    }
  }
}

impl SourceFilter {
  /// Whether the file at `path` is a candidate flow file.
  pub fn matches(&self, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      return false;
    };
    let suffix = format!(".{}", self.extension);
    name.ends_with(&suffix) && name != self.initializer
  }
}

/// Lazily walks a directory tree and yields candidate flow files.
///
/// Yield order follows directory listing order and is not stable across
/// platforms. Unreadable entries are logged and skipped. Symlinked
/// directories are not followed.
#[derive(Debug)]
pub struct FlowFiles {
  filter: SourceFilter,
  stack: Vec<(PathBuf, ReadDir)>,
}

impl Iterator for FlowFiles {
  type Item = PathBuf;

  fn next(&mut self) -> Option<PathBuf> {
    while let Some((dir_path, entries)) = self.stack.last_mut() {
      let entry = match entries.next() {
        Some(Ok(entry)) => entry,
        Some(Err(e)) => {
          warn!(dir = %dir_path.display(), error = %e, "skipping unreadable entry");
          continue;
        }
        None => {
          self.stack.pop();
          continue;
        }
      };

      let path = entry.path();
      let file_type = match entry.file_type() {
        Ok(t) => t,
        Err(e) => {
          warn!(path = %path.display(), error = %e, "skipping entry with unknown type");
          continue;
        }
      };

      if file_type.is_dir() {
        match fs::read_dir(&path) {
          Ok(entries) => self.stack.push((path, entries)),
          Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable directory"),
        }
        continue;
      }

      if file_type.is_symlink() && path.is_dir() {
        continue;
      }

      if self.filter.matches(&path) {
        return Some(path);
      }
    }

    None
  }
}

/// Find every flow file under `root`, including nested directories.
///
/// Fails immediately when `root` is missing or is not a directory.
pub fn discover(root: impl AsRef<Path>, filter: &SourceFilter) -> Result<FlowFiles, DiscoveryError> {
  let root = root.as_ref();

  let metadata = fs::metadata(root).map_err(|e| {
    if e.kind() == std::io::ErrorKind::NotFound {
      DiscoveryError::RootNotFound(root.to_path_buf())
    } else {
      DiscoveryError::Io {
        path: root.to_path_buf(),
        source: e,
      }
    }
  })?;

  if !metadata.is_dir() {
    return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
  }

  let entries = fs::read_dir(root).map_err(|e| DiscoveryError::Io {
    path: root.to_path_buf(),
    source: e,
  })?;

  Ok(FlowFiles {
    filter: filter.clone(),
    stack: vec![(root.to_path_buf(), entries)],
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_filter_matches_extension() {
    let filter = SourceFilter::default();
    assert!(filter.matches(Path::new("flows/hello_world.yaml")));
    assert!(!filter.matches(Path::new("flows/notes.txt")));
    assert!(!filter.matches(Path::new("flows/hello_world.yml")));
  }

  #[test]
  fn test_filter_skips_initializer() {
    let filter = SourceFilter::default();
    assert!(!filter.matches(Path::new("flows/mod.yaml")));
    assert!(filter.matches(Path::new("flows/not_mod.yaml")));
  }

  #[test]
  fn test_filter_custom_extension() {
    let filter = SourceFilter {
      extension: "json".to_string(),
      initializer: "index.json".to_string(),
    };
    assert!(filter.matches(Path::new("a/flow.json")));
    assert!(!filter.matches(Path::new("a/index.json")));
    assert!(!filter.matches(Path::new("a/flow.yaml")));
  }

  #[test]
  fn test_discover_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover(dir.path().join("missing"), &SourceFilter::default()).unwrap_err();
    assert!(matches!(err, DiscoveryError::RootNotFound(_)));
  }

  #[test]
  fn test_discover_root_is_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("flow.yaml");
    fs::write(&file, "flows: []").unwrap();

    let err = discover(&file, &SourceFilter::default()).unwrap_err();
    assert!(matches!(err, DiscoveryError::NotADirectory(_)));
  }
}
