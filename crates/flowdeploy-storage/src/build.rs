use chrono::Utc;
use flowdeploy_config::StorageDef;
use flowdeploy_flow::Flow;
use tracing::info;

use crate::{Error, LocalStore, S3Options, S3Store, Store, once};

/// Where a flow artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFlow {
  /// The flow's storage descriptor, pointing at the uploaded key.
  pub storage: StorageDef,
  pub key: String,
  /// Human readable location, e.g. `s3://bucket/hello-world/...`.
  pub location: String,
}

/// Open the backend described by a storage descriptor.
pub fn open_store(storage: &StorageDef) -> Result<Box<dyn Store>, Error> {
  match storage {
    StorageDef::S3 {
      bucket,
      region,
      endpoint,
      ..
    } => {
      let options = S3Options {
        region: region.clone(),
        endpoint: endpoint.clone(),
        ..S3Options::new(bucket)
      };
      Ok(Box::new(S3Store::new(&options)?))
    }
    StorageDef::Local { directory, .. } => Ok(Box::new(LocalStore::new(directory))),
  }
}

/// Serialize `flow` and upload it to the storage bound to it.
///
/// The artifact is written to the descriptor's explicit key, or to
/// `{flow-slug}/{UTC timestamp}` so every build gets a fresh object.
pub async fn build_flow_artifact(flow: &Flow) -> Result<StoredFlow, Error> {
  let storage = flow
    .storage
    .as_ref()
    .ok_or_else(|| Error::MissingStorage(flow.name.clone()))?;

  let key = match storage.key() {
    Some(key) => key.to_string(),
    None => default_key(flow),
  };

  let store = open_store(storage)?;
  store.put(&key, once(flow.to_bytes()?)).await?;

  let location = store.location(&key);
  info!(flow = %flow.name, location = %location, "flow artifact stored");

  Ok(StoredFlow {
    storage: storage.with_key(&key),
    key,
    location,
  })
}

fn default_key(flow: &Flow) -> String {
  format!(
    "{}/{}",
    flow.slug(),
    Utc::now().format("%Y-%m-%dt%H-%M-%S-%6f")
  )
}
