use crate::walker::{self, EntryKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of one purge. `failed_paths` keeps every entry that survived,
/// with the error text, so a caller can show exactly what was left behind.
#[derive(Debug, Default)]
pub struct PurgeOutcome {
    pub removed: u64,
    pub failed_paths: Vec<(PathBuf, String)>,
}

impl PurgeOutcome {
    pub fn ok(&self) -> bool {
        self.failed_paths.is_empty()
    }

    pub fn failed(&self) -> u64 {
        self.failed_paths.len() as u64
    }
}

/// Removes `root` and everything under it, children before parents.
///
/// Failures never stop the sweep; every removable entry is still removed
/// and the stragglers are reported in the outcome. Purging a path that
/// does not exist is a success. Symlinks are removed, never followed.
pub fn purge_subtree(root: &Path) -> PurgeOutcome {
    let mut outcome = PurgeOutcome::default();
    for entry in walker::walk_bottom_up(root) {
        let removed = match entry.kind {
            EntryKind::Dir => fs::remove_dir(&entry.path),
            EntryKind::File => fs::remove_file(&entry.path),
        };
        match removed {
            Ok(()) => outcome.removed += 1,
            // A concurrent deleter got there first. The entry is gone,
            // which is the state we wanted.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                log::warn!("purge: could not remove {}: {err}", entry.path.display());
                outcome.failed_paths.push((entry.path, err.to_string()));
            }
        }
    }
    outcome
}
