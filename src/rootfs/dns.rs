//! Resolver configuration inside the guest.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, instrument};

/// Nameservers written into the guest, in order.
pub const NAMESERVERS: &[&str] = &["1.1.1.1", "8.8.8.8"];

/// Renders the `resolv.conf` contents for [`NAMESERVERS`].
#[must_use]
pub fn resolv_conf_contents() -> String {
    NAMESERVERS
        .iter()
        .map(|ns| format!("nameserver {ns}\n"))
        .collect()
}

/// Overwrites `<rootfs>/etc/resolv.conf`, creating `etc` if needed.
///
/// # Errors
///
/// Returns the underlying I/O error. An existing symlink at the target
/// (Ubuntu images point it at systemd-resolved) is replaced by a plain file.
#[instrument(skip(rootfs), fields(rootfs = %rootfs.display()))]
pub fn write_resolv_conf(rootfs: &Path) -> io::Result<()> {
    let etc = rootfs.join("etc");
    fs::create_dir_all(&etc)?;

    let path = etc.join("resolv.conf");
    if fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink()) {
        debug!(path = %path.display(), "Replacing resolv.conf symlink");
        fs::remove_file(&path)?;
    }

    fs::write(&path, resolv_conf_contents())
}
