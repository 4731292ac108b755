//! Permission helpers.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::debug;

/// Owner execute bit.
pub const OWNER_EXEC: u32 = 0o100;

/// Adds the owner-execute bit to `path`, keeping the other mode bits.
///
/// Returns the resulting mode.
///
/// # Errors
///
/// Returns the underlying I/O error if the metadata cannot be read or the
/// permissions cannot be changed.
pub fn make_executable(path: &Path) -> io::Result<u32> {
    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode() | OWNER_EXEC;
    permissions.set_mode(mode);
    fs::set_permissions(path, permissions)?;

    debug!(path = %path.display(), mode = format!("{:o}", mode & 0o7777), "Marked executable");
    Ok(mode)
}

/// Adds `bits` to the mode of `path`. Used to unlock entries before removal.
pub(crate) fn add_mode_bits(path: &Path, bits: u32) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    // Symlink modes are meaningless and chmod would follow the link.
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | bits);
    fs::set_permissions(path, permissions)
}
