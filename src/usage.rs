use crate::walker::{self, EntryKind};
use std::path::Path;

/// Aggregate of one subtree walk. `skipped` counts entries the walk could
/// not read; a nonzero value means `bytes` is a lower bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub bytes: u64,
    pub files: u64,
    pub dirs: u64,
    pub skipped: u64,
}

/// Sums file lengths under `root` in a single traversal. A missing root
/// measures 0. Directory entries contribute no bytes of their own.
pub fn measure(root: &Path) -> Usage {
    let mut walk = walker::walk(root);
    let mut usage = Usage::default();
    for entry in walk.by_ref() {
        match entry.kind {
            EntryKind::File => {
                usage.files += 1;
                usage.bytes = usage.bytes.saturating_add(entry.len);
            }
            EntryKind::Dir => usage.dirs += 1,
        }
    }
    usage.skipped = walk.skipped();
    usage
}

pub fn subtree_size(root: &Path) -> u64 {
    measure(root).bytes
}
