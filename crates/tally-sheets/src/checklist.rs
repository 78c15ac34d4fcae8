//! [`SheetChecklist`]: the maintenance checklist as a fixed worksheet grid.
//!
//! Row 1 carries the month headings and column A the task labels, so task
//! rows start at 2 and month columns run B..M. Each signed cell reads
//! `operator | engineer`.

use tally_core::{
  checklist::{ChecklistGrid, ChecklistTask, Month, SignOff},
  store::ChecklistStore,
};

use crate::{Error, Result, client::SheetClient};

pub struct SheetChecklist<C> {
  client: C,
}

impl<C: SheetClient> SheetChecklist<C> {
  pub fn new(client: C) -> Self { Self { client } }

  pub fn client(&self) -> &C { &self.client }
}

impl<C: SheetClient> ChecklistStore for SheetChecklist<C> {
  type Error = Error;

  async fn sign_off(&self, task: ChecklistTask, month: Month, sign_off: SignOff) -> Result<()> {
    self
      .client
      .update_cell(task.row(), month.column(), sign_off.to_string())
      .await?;
    tracing::debug!(%task, %month, "signed checklist cell");
    Ok(())
  }

  async fn grid(&self) -> Result<ChecklistGrid> {
    let rows = self.client.get_all_values().await?;
    let mut grid = ChecklistGrid::new();

    for (r, cells) in (1u32..).zip(&rows) {
      let Some(task) = ChecklistTask::from_row(r) else { continue };
      for (c, cell) in (1u32..).zip(cells) {
        let Some(month) = Month::from_column(c) else { continue };
        if cell.trim().is_empty() {
          continue;
        }
        match cell.parse::<SignOff>() {
          Ok(sign_off) => {
            grid.set(task, month, sign_off);
          }
          Err(error) => {
            tracing::warn!(%task, %month, %error, "ignoring unreadable checklist cell")
          }
        }
      }
    }
    Ok(grid)
  }
}
