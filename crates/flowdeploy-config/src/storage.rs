use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage descriptor: where a flow's packaged definition is persisted when
/// it is registered.
///
/// The registration pipeline holds one template value and binds a fresh
/// clone to every flow it registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageDef {
  /// An S3 bucket. Flows are stored at `key`, or at `{flow-slug}/{timestamp}`
  /// when no key is given.
  S3 {
    bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
  },

  /// A directory on the local filesystem.
  Local {
    directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
  },
}

impl StorageDef {
  pub fn s3(bucket: impl Into<String>) -> Self {
    StorageDef::S3 {
      bucket: bucket.into(),
      key: None,
      region: None,
      endpoint: None,
    }
  }

  pub fn local(directory: impl Into<PathBuf>) -> Self {
    StorageDef::Local {
      directory: directory.into(),
      key: None,
    }
  }

  /// The explicit storage key, if one was configured.
  pub fn key(&self) -> Option<&str> {
    match self {
      StorageDef::S3 { key, .. } | StorageDef::Local { key, .. } => key.as_deref(),
    }
  }

  /// A copy of this descriptor pointing at `key`.
  pub fn with_key(&self, key: impl Into<String>) -> Self {
    let mut storage = self.clone();
    match &mut storage {
      StorageDef::S3 { key: k, .. } | StorageDef::Local { key: k, .. } => *k = Some(key.into()),
    }
    storage
  }
}
