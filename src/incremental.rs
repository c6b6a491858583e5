use anyhow::Result;
use std::path::Path;

use crate::fsops::remove_if_exists;
use crate::input::ChangeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the existing output alone.
    Skip,
    /// Drop the existing output, nothing is produced.
    Delete,
    /// (Re)produce the output.
    Process,
}

/// Full rebuilds process everything. Unknown statuses are skipped.
pub fn classify(incremental: bool, status: ChangeStatus) -> Action {
    if !incremental {
        return Action::Process;
    }
    match status {
        ChangeStatus::Unchanged => Action::Skip,
        ChangeStatus::Removed => Action::Delete,
        ChangeStatus::Added | ChangeStatus::Changed => Action::Process,
        ChangeStatus::Unknown => Action::Skip,
    }
}

/// Classifies and performs the removal when asked to. Returns whether the
/// caller still has to produce the output at `dest`.
pub fn reconcile(incremental: bool, status: ChangeStatus, dest: &Path) -> Result<bool> {
    match classify(incremental, status) {
        Action::Skip => Ok(false),
        Action::Delete => {
            remove_if_exists(dest)?;
            Ok(false)
        }
        Action::Process => Ok(true),
    }
}
