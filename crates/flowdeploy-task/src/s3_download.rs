use flowdeploy_config::ClientOptions;
use flowdeploy_storage::{S3Options, S3Store, Store, read_all};
use serde::Deserialize;

use crate::aws::AwsCredentials;
use crate::error::TaskError;
use crate::params::{non_empty, resolve};

/// Call-time overrides for [`S3Download`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadParams {
  #[serde(default)]
  pub bucket: Option<String>,
  #[serde(default)]
  pub key: Option<String>,
}

/// Downloads one object from S3.
///
/// Returns the object as a string, or as an array of bytes when `as_bytes`
/// is set.
#[derive(Debug, Clone, Default)]
pub struct S3Download {
  bucket: Option<String>,
  key: Option<String>,
  as_bytes: bool,
  client_options: ClientOptions,
}

impl S3Download {
  pub fn new(
    bucket: Option<String>,
    key: Option<String>,
    as_bytes: bool,
    client_options: ClientOptions,
  ) -> Self {
    Self {
      bucket,
      key,
      as_bytes,
      client_options,
    }
  }

  /// Download using credentials passed in, or the environment's.
  pub async fn run(
    &self,
    credentials: Option<&AwsCredentials>,
    overrides: DownloadParams,
  ) -> Result<serde_json::Value, TaskError> {
    let bucket = resolve(overrides.bucket.clone(), &self.bucket);
    let Some(bucket) = non_empty(&bucket) else {
      return Err(TaskError::InvalidArgument("a bucket must be provided".to_string()));
    };

    let options = S3Options {
      region: self.client_options.region.clone(),
      endpoint: self.client_options.endpoint_url.clone(),
      access_key_id: credentials.map(|c| c.access_key.clone()),
      secret_access_key: credentials.map(|c| c.secret_access_key.clone()),
      session_token: credentials.and_then(|c| c.session_token.clone()),
      ..S3Options::new(bucket)
    };
    let store = S3Store::new(&options)?;

    self.run_with(&store, overrides).await
  }

  /// Download from an already opened store.
  pub async fn run_with<S: Store + ?Sized>(
    &self,
    store: &S,
    overrides: DownloadParams,
  ) -> Result<serde_json::Value, TaskError> {
    let key = resolve(overrides.key, &self.key);
    let Some(key) = non_empty(&key) else {
      return Err(TaskError::InvalidArgument("a key must be provided".to_string()));
    };

    let data = read_all(store.get(key).await?).await?;

    if self.as_bytes {
      return Ok(serde_json::Value::from(data.to_vec()));
    }
    let text = String::from_utf8(data.to_vec())
      .map_err(|e| TaskError::invalid_input("key", format!("object is not UTF-8 ({}), set as_bytes", e)))?;
    Ok(serde_json::Value::String(text))
  }
}

#[cfg(test)]
mod tests {
  use flowdeploy_storage::{LocalStore, once};

  use super::*;

  #[tokio::test]
  async fn test_download_text() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store
      .put("mvg/departures/1587357722.json", once(r#"{"departures": []}"#))
      .await
      .unwrap();

    let task = S3Download::new(
      Some("transport-tracker".to_string()),
      Some("mvg/departures/1587357722.json".to_string()),
      false,
      ClientOptions::default(),
    );
    let output = task.run_with(&store, DownloadParams::default()).await.unwrap();
    assert_eq!(output, serde_json::json!(r#"{"departures": []}"#));
  }

  #[tokio::test]
  async fn test_download_bytes_with_key_override() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.put("raw.bin", once(vec![0u8, 159, 255])).await.unwrap();

    let task = S3Download::new(None, Some("other".to_string()), true, ClientOptions::default());
    let overrides = DownloadParams {
      bucket: None,
      key: Some("raw.bin".to_string()),
    };
    let output = task.run_with(&store, overrides).await.unwrap();
    assert_eq!(output, serde_json::json!([0, 159, 255]));
  }

  #[tokio::test]
  async fn test_download_requires_bucket() {
    let task = S3Download::default();
    let err = task.run(None, DownloadParams::default()).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument(_)));
  }

  #[tokio::test]
  async fn test_download_missing_object() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    let task = S3Download::new(None, Some("missing".to_string()), false, ClientOptions::default());

    let err = task.run_with(&store, DownloadParams::default()).await.unwrap_err();
    assert!(matches!(
      err,
      TaskError::Storage(flowdeploy_storage::Error::NotFound(_))
    ));
  }
}
