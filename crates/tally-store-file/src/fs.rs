//! Small async filesystem helpers shared by the file stores.

use std::{
  io::{ErrorKind, SeekFrom},
  path::{Path, PathBuf},
};

use tokio::io::{AsyncReadExt as _, AsyncSeekExt as _, AsyncWriteExt as _};

use crate::{Error, Result};

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_path_buf(), source }
}

/// Read the whole file, or `None` if it does not exist yet.
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
  match tokio::fs::read(path).await {
    Ok(bytes) => Ok(Some(bytes)),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
    Err(e) => Err(io_err(path)(e)),
  }
}

async fn ensure_parent(path: &Path) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .map_err(io_err(parent))?;
  }
  Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Replace `path` with `bytes`. The content is written and synced to a
/// sibling temp file first, then renamed over the target, so readers see
/// either the old or the new document, never a torn one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
  ensure_parent(path).await?;
  let tmp = temp_path(path);

  let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err(&tmp))?;
  file.write_all(bytes).await.map_err(io_err(&tmp))?;
  file.sync_all().await.map_err(io_err(&tmp))?;
  drop(file);

  tokio::fs::rename(&tmp, path).await.map_err(io_err(path))
}

/// Move `from` over `to`.
pub async fn rename(from: &Path, to: &Path) -> Result<()> {
  tokio::fs::rename(from, to).await.map_err(io_err(to))
}

/// Remove `path`; a file that is already gone is not an error.
pub async fn remove(path: &Path) -> Result<()> {
  match tokio::fs::remove_file(path).await {
    Err(e) if e.kind() != ErrorKind::NotFound => Err(io_err(path)(e)),
    _ => Ok(()),
  }
}

async fn ends_with_newline(file: &mut tokio::fs::File, path: &Path) -> Result<bool> {
  file.seek(SeekFrom::End(-1)).await.map_err(io_err(path))?;
  let mut last = [0u8; 1];
  file.read_exact(&mut last).await.map_err(io_err(path))?;
  Ok(last[0] == b'\n')
}

/// Append to `path`, creating it if needed. `bytes` is told whether the file
/// was empty beforehand so it can prepend a header.
///
/// A torn final line left by an earlier crash is terminated first, so the
/// new bytes always start a line of their own. A failed write is truncated
/// back to the previous length.
pub async fn append(path: &Path, bytes: impl FnOnce(bool) -> Result<Vec<u8>>) -> Result<()> {
  ensure_parent(path).await?;
  let mut file = tokio::fs::OpenOptions::new()
    .create(true)
    .read(true)
    .append(true)
    .open(path)
    .await
    .map_err(io_err(path))?;
  let len = file.metadata().await.map_err(io_err(path))?.len();
  let torn = len > 0 && !ends_with_newline(&mut file, path).await?;

  let mut bytes = bytes(len == 0)?;
  if torn {
    tracing::warn!(path = %path.display(), "terminating a torn final line");
    bytes.insert(0, b'\n');
  }

  let written = async {
    file.write_all(&bytes).await?;
    file.flush().await
  }
  .await;
  if let Err(e) = written {
    if let Err(error) = file.set_len(len).await {
      tracing::warn!(path = %path.display(), %error, "could not roll back a failed append");
    }
    return Err(io_err(path)(e));
  }
  file.sync_data().await.map_err(io_err(path))
}
