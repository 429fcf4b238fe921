use async_trait::async_trait;
use futures::StreamExt;
use object_store::ObjectStore;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use tracing::{debug, info};

use crate::{ByteStream, Error, Store, read_all};

/// Connection settings for an S3 bucket.
///
/// Unset fields fall back to the standard `AWS_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct S3Options {
  pub bucket: String,
  pub region: Option<String>,
  /// Custom endpoint for S3-compatible services.
  pub endpoint: Option<String>,
  pub access_key_id: Option<String>,
  pub secret_access_key: Option<String>,
  pub session_token: Option<String>,
}

impl S3Options {
  pub fn new(bucket: impl Into<String>) -> Self {
    Self {
      bucket: bucket.into(),
      ..Self::default()
    }
  }
}

/// S3-backed artifact store.
pub struct S3Store {
  store: AmazonS3,
  bucket: String,
}

impl S3Store {
  pub fn new(options: &S3Options) -> Result<Self, Error> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(&options.bucket);

    if let Some(region) = &options.region {
      builder = builder.with_region(region);
    }
    if let Some(endpoint) = &options.endpoint {
      builder = builder
        .with_endpoint(endpoint)
        .with_allow_http(endpoint.starts_with("http://"));
    }
    if let (Some(access_key_id), Some(secret_access_key)) =
      (&options.access_key_id, &options.secret_access_key)
    {
      builder = builder
        .with_access_key_id(access_key_id)
        .with_secret_access_key(secret_access_key);
      if let Some(token) = &options.session_token {
        builder = builder.with_token(token);
      }
    }

    let store = builder
      .build()
      .map_err(|e| Error::ClientCreation(e.to_string()))?;

    info!(bucket = %options.bucket, "S3 client created");

    Ok(Self {
      store,
      bucket: options.bucket.clone(),
    })
  }

  fn object_path(key: &str) -> Result<ObjectPath, Error> {
    ObjectPath::parse(key).map_err(|e| Error::InvalidPath(e.to_string()))
  }
}

#[async_trait]
impl Store for S3Store {
  async fn get(&self, key: &str) -> Result<ByteStream, Error> {
    debug!(bucket = %self.bucket, key = %key, "downloading from S3");

    let path = Self::object_path(key)?;
    let result = self.store.get(&path).await.map_err(|e| match e {
      object_store::Error::NotFound { .. } => Error::NotFound(key.to_string()),
      source => Error::S3 {
        key: key.to_string(),
        source,
      },
    })?;

    let owned_key = key.to_string();
    let stream = result.into_stream().map(move |chunk| {
      chunk.map_err(|source| Error::S3 {
        key: owned_key.clone(),
        source,
      })
    });
    Ok(Box::pin(stream))
  }

  async fn put(&self, key: &str, data: ByteStream) -> Result<(), Error> {
    let path = Self::object_path(key)?;
    let bytes = read_all(data).await?;
    let size = bytes.len();

    self
      .store
      .put(&path, bytes.into())
      .await
      .map_err(|source| Error::S3 {
        key: key.to_string(),
        source,
      })?;

    info!(bucket = %self.bucket, key = %key, size = size, "uploaded to S3");
    Ok(())
  }

  fn location(&self, key: &str) -> String {
    format!("s3://{}/{}", self.bucket, key)
  }
}
