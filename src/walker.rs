use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One visited node. `len` is the byte length for files and 0 for directories.
/// Symlinks are never followed and are reported as files sized by `lstat`.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub len: u64,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Lazy depth-first traversal of a subtree.
///
/// A missing root yields an empty walk. Entries that cannot be read are
/// dropped silently and counted in `skipped`, so a walk never fails as a
/// whole. Sibling order is whatever the underlying directory reader gives.
pub struct Walk {
    inner: walkdir::IntoIter,
    skipped: u64,
}

/// Walks top-down: each directory is yielded before its contents.
pub fn walk(root: &Path) -> Walk {
    Walk {
        inner: WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .into_iter(),
        skipped: 0,
    }
}

/// Walks bottom-up: contents are yielded before their directory, so the
/// root comes last. This is the order a deleter needs.
pub fn walk_bottom_up(root: &Path) -> Walk {
    Walk {
        inner: WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .contents_first(true)
            .into_iter(),
        skipped: 0,
    }
}

impl Walk {
    /// Number of entries dropped because they could not be read.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for Walk {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    // A root that does not exist is an empty walk,
                    // not a degraded one.
                    let missing_root = err.depth() == 0
                        && err
                            .io_error()
                            .map(|e| e.kind() == io::ErrorKind::NotFound)
                            .unwrap_or(false);
                    if !missing_root {
                        log::debug!("walk: skipping unreadable entry: {err}");
                        self.skipped += 1;
                    }
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                return Some(Entry {
                    path: entry.into_path(),
                    kind: EntryKind::Dir,
                    len: 0,
                });
            }
            let len = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(_) => {
                    // Raced away between listing and stat. Report it with
                    // length 0 and note the degradation.
                    self.skipped += 1;
                    0
                }
            };
            return Some(Entry {
                path: entry.into_path(),
                kind: EntryKind::File,
                len,
            });
        }
    }
}
