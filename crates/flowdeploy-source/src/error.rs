use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while looking for flow files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
  /// The root directory does not exist.
  #[error("flows directory not found: {}", .0.display())]
  RootNotFound(PathBuf),

  /// The root path exists but is not a directory.
  #[error("not a directory: {}", .0.display())]
  NotADirectory(PathBuf),

  /// The root directory could not be read.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Errors raised while loading the flow defined in a single file.
#[derive(Debug, Error)]
pub enum ExtractError {
  /// The file defines no flow.
  #[error("no flow found in {}", .path.display())]
  NoFlowFound { path: PathBuf },

  /// The file defines more than one flow.
  #[error("{count} flows found in {}, expected exactly one", .path.display())]
  MultipleFlowsFound { path: PathBuf, count: usize },

  /// The file could not be read, parsed or validated.
  #[error("failed to load {}: {message}", .path.display())]
  Load { path: PathBuf, message: String },
}

impl ExtractError {
  pub(crate) fn load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
    Self::Load {
      path: path.into(),
      message: message.to_string(),
    }
  }

  /// The file that failed to load.
  pub fn path(&self) -> &std::path::Path {
    match self {
      Self::NoFlowFound { path } | Self::MultipleFlowsFound { path, .. } | Self::Load { path, .. } => {
        path
      }
    }
  }
}
