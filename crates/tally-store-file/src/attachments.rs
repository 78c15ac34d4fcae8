//! [`AttachmentDir`]: images submitted alongside production records.
//!
//! Files live at `<root>/<plant>/<line>/<period>.<ext>`. Each name segment is
//! escaped byte-wise, so a plant or line name can never escape the root and
//! two different names never share a directory.
//!
//! Writes happen in two steps. [`AttachmentDir::stage`] puts the bytes beside
//! the target under a hash-suffixed name; [`AttachmentDir::commit`] renames
//! them into place once the ledger has accepted the record, and
//! [`AttachmentDir::discard`] drops them when it has not.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tally_core::{
  period::Period,
  plant::{Line, Plant},
  record::Attachment,
};

use crate::{Error, Result, fs};

/// Largest attachment accepted, in bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AttachmentDir {
  root: PathBuf,
}

/// An attachment written to disk but not yet visible at its final path.
#[derive(Debug)]
#[must_use = "a staged attachment must be committed or discarded"]
pub struct StagedAttachment {
  attachment: Attachment,
  staged:     PathBuf,
  target:     PathBuf,
}

impl StagedAttachment {
  /// The reference the ledger should store for this image.
  pub fn attachment(&self) -> &Attachment { &self.attachment }
}

fn extension_for(media_type: &str) -> Result<&'static str> {
  match media_type.trim().to_ascii_lowercase().as_str() {
    "image/png" => Ok("png"),
    "image/jpeg" | "image/jpg" => Ok("jpg"),
    "image/gif" => Ok("gif"),
    "image/webp" => Ok("webp"),
    other => Err(Error::UnsupportedMediaType(other.to_owned())),
  }
}

/// ASCII letters, digits and `-` pass through; every other byte becomes
/// `%XX`. The mapping is injective because `%` itself is always escaped.
fn escape_segment(segment: &str) -> String {
  let mut out = String::with_capacity(segment.len());
  for b in segment.bytes() {
    if b.is_ascii_alphanumeric() || b == b'-' {
      out.push(char::from(b));
    } else {
      out.push('%');
      out.push_str(&hex::encode_upper([b]));
    }
  }
  out
}

impl AttachmentDir {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// The path, relative to the root, an attachment for this key is stored at.
  pub fn relative_path(
    plant: &Plant,
    line: &Line,
    period: &Period,
    media_type: &str,
  ) -> Result<String> {
    let ext = extension_for(media_type)?;
    Ok(format!(
      "{}/{}/{period}.{ext}",
      escape_segment(plant.as_str()),
      escape_segment(line.as_str()),
    ))
  }

  /// Write `bytes` beside the key's final path. Nothing already stored for
  /// the key is touched until [`commit`](Self::commit).
  pub async fn stage(
    &self,
    plant: &Plant,
    line: &Line,
    period: &Period,
    media_type: &str,
    bytes: &[u8],
  ) -> Result<StagedAttachment> {
    if bytes.len() > MAX_ATTACHMENT_BYTES {
      return Err(Error::AttachmentTooLarge(bytes.len()));
    }
    let path = Self::relative_path(plant, line, period, media_type)?;
    let content_hash = hex::encode(Sha256::digest(bytes));

    let target = self.root.join(&path);
    let mut staged = target.clone().into_os_string();
    staged.push(format!(".{}.staged", &content_hash[..16]));
    let staged = PathBuf::from(staged);
    fs::write_atomic(&staged, bytes).await?;

    tracing::debug!(%path, bytes = bytes.len(), "staged attachment");
    Ok(StagedAttachment {
      attachment: Attachment {
        path,
        content_hash,
        media_type: media_type.trim().to_ascii_lowercase(),
      },
      staged,
      target,
    })
  }

  /// Move a staged attachment over its final path, replacing any earlier
  /// image for the key.
  pub async fn commit(&self, staged: StagedAttachment) -> Result<Attachment> {
    fs::rename(&staged.staged, &staged.target).await?;
    tracing::debug!(path = %staged.attachment.path, "stored attachment");
    Ok(staged.attachment)
  }

  /// Drop a staged attachment; the stored image for the key is unchanged.
  pub async fn discard(&self, staged: StagedAttachment) {
    if let Err(error) = fs::remove(&staged.staged).await {
      tracing::warn!(%error, "could not remove staged attachment");
    }
  }

  /// Stage and commit in one step.
  pub async fn save(
    &self,
    plant: &Plant,
    line: &Line,
    period: &Period,
    media_type: &str,
    bytes: &[u8],
  ) -> Result<Attachment> {
    let staged = self.stage(plant, line, period, media_type, bytes).await?;
    self.commit(staged).await
  }

  /// Absolute location of a stored attachment.
  pub fn resolve(&self, attachment: &Attachment) -> PathBuf { self.root.join(&attachment.path) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn distinct_names_never_share_a_segment() {
    let names = ["Plant A", "Plant_A", "Plant%20A", "工厂一", "工厂二", ".", ".."];
    let escaped: std::collections::BTreeSet<String> =
      names.iter().map(|n| escape_segment(n)).collect();
    assert_eq!(escaped.len(), names.len());
    assert_eq!(escape_segment("Plant A"), "Plant%20A");
    assert_eq!(escape_segment("Line-1"), "Line-1");
    assert_eq!(escape_segment(".."), "%2E%2E");
  }
}
