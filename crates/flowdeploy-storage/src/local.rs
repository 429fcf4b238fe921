use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{ByteStream, Error, Store, once};

/// Flow artifacts kept in a local directory, the backend of
/// `StorageDef::Local`.
///
/// Keys are relative paths below the directory. Writes go to a hidden
/// sibling file first and are renamed into place, so an agent reading the
/// artifact never sees a partial flow.
pub struct LocalStore {
  directory: PathBuf,
}

impl LocalStore {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// Map a key to its file, refusing keys that would escape the directory.
  fn artifact_path(&self, key: &str) -> Result<PathBuf, Error> {
    let relative = Path::new(key);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if key.is_empty() || escapes {
      return Err(Error::InvalidPath(key.to_string()));
    }
    Ok(self.directory.join(relative))
  }
}

fn staging_path(path: &Path) -> Result<PathBuf, Error> {
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
  Ok(path.with_file_name(format!(".{}.{}.partial", name, std::process::id())))
}

#[async_trait]
impl Store for LocalStore {
  async fn get(&self, key: &str) -> Result<ByteStream, Error> {
    let path = self.artifact_path(key)?;
    match fs::read(&path).await {
      Ok(data) => Ok(once(data)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(key.to_string())),
      Err(e) => Err(Error::Io(e)),
    }
  }

  async fn put(&self, key: &str, mut data: ByteStream) -> Result<(), Error> {
    let path = self.artifact_path(key)?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(&path)?;
    let written = async {
      let mut file = fs::File::create(&staging).await?;
      while let Some(chunk) = data.next().await {
        file.write_all(&chunk?).await?;
      }
      file.sync_all().await?;
      Ok::<_, Error>(())
    }
    .await;

    if let Err(e) = written {
      let _ = fs::remove_file(&staging).await;
      return Err(e);
    }
    fs::rename(&staging, &path).await?;
    Ok(())
  }

  fn location(&self, key: &str) -> String {
    format!("file://{}", self.directory.join(key).display())
  }
}
