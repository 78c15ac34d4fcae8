//! [`JsonChecklistStore`]: the maintenance checklist as one JSON document.

use std::path::{Path, PathBuf};

use tally_core::{
  checklist::{ChecklistGrid, ChecklistTask, Month, SignOff},
  store::ChecklistStore,
};
use tokio::sync::Mutex;

use crate::{Result, fs};

pub struct JsonChecklistStore {
  path:  PathBuf,
  write: Mutex<()>,
}

impl JsonChecklistStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path { &self.path }

  async fn load(&self) -> Result<ChecklistGrid> {
    let Some(bytes) = fs::read_optional(&self.path).await? else {
      return Ok(ChecklistGrid::new());
    };
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|error| {
      tracing::warn!(
        path = %self.path.display(),
        %error,
        "checklist file is malformed; treating it as empty"
      );
      ChecklistGrid::new()
    }))
  }
}

impl ChecklistStore for JsonChecklistStore {
  type Error = crate::Error;

  async fn sign_off(&self, task: ChecklistTask, month: Month, sign_off: SignOff) -> Result<()> {
    let _guard = self.write.lock().await;

    let mut grid = self.load().await?;
    grid.set(task, month, sign_off);
    let bytes = serde_json::to_vec_pretty(&grid)?;
    fs::write_atomic(&self.path, &bytes).await?;

    tracing::debug!(path = %self.path.display(), %task, %month, "signed checklist cell");
    Ok(())
  }

  async fn grid(&self) -> Result<ChecklistGrid> { self.load().await }
}
