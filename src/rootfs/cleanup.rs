//! Forced removal of a root filesystem tree.
//!
//! Extracted distribution trees routinely contain read-only directories
//! (`/proc`-style mount points with mode 0555, `/root` with 0700 and so on),
//! which make a plain `remove_dir_all` fail for an unprivileged user. The
//! fallback walks the tree bottom-up and retries each failed removal once
//! after granting the owner write and search permission.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::permissions::add_mode_bits;

/// Bits granted to an entry and its parent before a removal is retried.
const UNLOCK_BITS: u32 = 0o700;

/// Summary of a forced removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Entries removed by the fallback walk.
    pub removed: usize,
    /// Entries that could not be removed even after unlocking.
    pub failed: usize,
}

impl RemovalReport {
    /// Returns true if everything was removed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Removes `root` and everything below it, best effort.
///
/// Never fails: entries that cannot be removed are logged and counted.
#[instrument(skip(root), fields(root = %root.display()))]
pub fn remove_tree(root: &Path) -> RemovalReport {
    let mut report = RemovalReport::default();

    if fs::symlink_metadata(root).is_err() {
        return report;
    }

    match fs::remove_dir_all(root) {
        Ok(()) => return report,
        Err(e) => debug!(error = %e, "Plain removal failed, falling back to forced removal"),
    }

    // Unlock directories top-down so the walk below can descend into them.
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            if let Err(e) = add_mode_bits(entry.path(), UNLOCK_BITS) {
                debug!(path = %entry.path().display(), error = %e, "Could not unlock directory");
            }
        }
    }

    for entry in WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to walk {}: {e}", root.display());
                report.failed += 1;
                continue;
            }
        };

        let path = entry.path();
        let is_dir = entry.file_type().is_dir();
        match remove_with_retry(path, is_dir) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!("Failed to force remove {}: {e}", path.display());
                report.failed += 1;
            }
        }
    }

    debug!(removed = report.removed, failed = report.failed, "Forced removal finished");
    report
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

fn remove_with_retry(path: &Path, is_dir: bool) -> io::Result<()> {
    match remove_entry(path, is_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(first) => {
            debug!(path = %path.display(), error = %first, "Removal failed, unlocking and retrying");
            if let Some(parent) = path.parent() {
                if let Err(e) = add_mode_bits(parent, UNLOCK_BITS) {
                    debug!(path = %parent.display(), error = %e, "Could not unlock parent");
                }
            }
            if let Err(e) = add_mode_bits(path, UNLOCK_BITS) {
                debug!(path = %path.display(), error = %e, "Could not unlock entry");
            }
            remove_entry(path, is_dir)
        }
    }
}
