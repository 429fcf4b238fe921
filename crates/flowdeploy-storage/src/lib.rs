//! Flowdeploy Storage
//!
//! This crate stores flow artifacts: the serialized form of a flow that the
//! orchestration agent downloads when it runs the flow.
//!
//! The [`Store`] trait defines the backend layer. [`LocalStore`] writes to a local
//! directory and [`S3Store`] writes to an S3 bucket. [`build_flow_artifact`]
//! picks the backend from the storage descriptor bound to a flow and uploads
//! the flow there.
//!
//! Uploads are streamed. Local reads load the whole artifact, which is a
//! single serialized flow.

mod build;
mod local;
mod s3;

pub use build::{StoredFlow, build_flow_artifact, open_store};
pub use local::LocalStore;
pub use s3::{S3Options, S3Store};

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// A boxed stream of bytes for artifact data.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Error type for artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested artifact was not found.
  #[error("artifact not found: {0}")]
  NotFound(String),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to create S3 client: {0}")]
  ClientCreation(String),

  #[error("invalid object path: {0}")]
  InvalidPath(String),

  #[error("s3 request failed for key '{key}': {source}")]
  S3 {
    key: String,
    #[source]
    source: object_store::Error,
  },

  /// The flow has no storage descriptor bound to it.
  #[error("flow '{0}' has no storage configured")]
  MissingStorage(String),

  #[error("failed to serialize flow: {0}")]
  Serialize(#[from] flowdeploy_flow::FlowError),
}

/// Artifact storage trait.
#[async_trait]
pub trait Store: Send + Sync {
  /// Retrieve an artifact by key.
  async fn get(&self, key: &str) -> Result<ByteStream, Error>;

  /// Store an artifact, replacing any previous content at `key`.
  async fn put(&self, key: &str, data: ByteStream) -> Result<(), Error>;

  /// Human readable location of `key`, e.g. `s3://bucket/key`.
  fn location(&self, key: &str) -> String;
}

/// Wrap an in-memory buffer as a [`ByteStream`].
pub fn once(data: impl Into<Bytes>) -> ByteStream {
  let data = data.into();
  Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Drain a [`ByteStream`] into a single buffer.
pub async fn read_all(mut stream: ByteStream) -> Result<Bytes, Error> {
  let mut buf = BytesMut::new();
  while let Some(chunk) = stream.next().await {
    buf.extend_from_slice(&chunk?);
  }
  Ok(buf.freeze())
}
