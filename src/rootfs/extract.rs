//! Unpacking of the xz-compressed root filesystem tarball.
//!
//! Character and block device entries are skipped: creating device nodes
//! needs privileges an unprivileged user does not have, and PRoot binds the
//! host `/dev` anyway. Everything else (regular files, directories,
//! symlinks, hard links, FIFOs) is unpacked with permissions and mtimes.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tar::{Archive, EntryType};
use tracing::{debug, instrument, trace, warn};
use xz2::read::XzDecoder;

/// Counters collected while unpacking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Entries written to disk.
    pub unpacked: usize,
    /// Character and block device entries that were skipped.
    pub skipped_devices: usize,
    /// Entries skipped because their path would escape the destination.
    pub skipped_unsafe: usize,
}

/// Returns true for entry types that are never unpacked.
#[must_use]
pub fn is_device(entry_type: EntryType) -> bool {
    matches!(entry_type, EntryType::Char | EntryType::Block)
}

/// Unpacks the `.tar.xz` file at `archive` into `dest`.
///
/// # Errors
///
/// Returns the first I/O, decompression or archive error encountered.
#[instrument(skip(archive, dest), fields(archive = %archive.display(), dest = %dest.display()))]
pub fn extract_tar_xz(archive: &Path, dest: &Path) -> io::Result<ExtractStats> {
    let file = File::open(archive)?;
    let decoder = XzDecoder::new(BufReader::new(file));
    unpack_filtered(decoder, dest)
}

/// Unpacks an uncompressed tar stream into `dest`, skipping device entries.
///
/// Directory entries are applied last, deepest first, so a read-only
/// directory does not block the files that belong inside it.
///
/// # Errors
///
/// Returns the first I/O or archive error encountered.
pub fn unpack_filtered<R: Read>(reader: R, dest: &Path) -> io::Result<ExtractStats> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_unpack_xattrs(false);
    archive.set_overwrite(true);

    let mut stats = ExtractStats::default();
    let mut directories = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();

        if is_device(entry_type) {
            debug!(path = %entry.path()?.display(), ?entry_type, "Skipping device entry");
            stats.skipped_devices += 1;
            continue;
        }

        if entry_type == EntryType::Directory {
            directories.push(entry);
            continue;
        }

        trace!(path = %entry.path()?.display(), "Unpacking");
        if entry.unpack_in(dest)? {
            stats.unpacked += 1;
        } else {
            warn!(path = %entry.path()?.display(), "Skipping entry outside the destination");
            stats.skipped_unsafe += 1;
        }
    }

    directories.sort_by(|a, b| b.path_bytes().cmp(&a.path_bytes()));
    for mut dir in directories {
        if dir.unpack_in(dest)? {
            stats.unpacked += 1;
        } else {
            warn!(path = %dir.path()?.display(), "Skipping entry outside the destination");
            stats.skipped_unsafe += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use tar::{Builder, Header};
    use tempfile::TempDir;
    use xz2::write::XzEncoder;

    fn append_dir(builder: &mut Builder<Vec<u8>>, path: &str, mode: u32) {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(mode);
        builder
            .append_data(&mut header, path, io::empty())
            .expect("append dir");
    }

    fn append_file(builder: &mut Builder<Vec<u8>>, path: &str, mode: u32, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        builder
            .append_data(&mut header, path, data)
            .expect("append file");
    }

    fn append_device(builder: &mut Builder<Vec<u8>>, path: &str, entry_type: EntryType) {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_size(0);
        header.set_mode(0o666);
        header.set_device_major(1).expect("major");
        header.set_device_minor(3).expect("minor");
        builder
            .append_data(&mut header, path, io::empty())
            .expect("append device");
    }

    fn sample_tar() -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        append_dir(&mut builder, "bin/", 0o755);
        append_file(&mut builder, "bin/bash", 0o755, b"#!/bin/sh\n");
        append_dir(&mut builder, "dev/", 0o755);
        append_device(&mut builder, "dev/null", EntryType::Char);
        append_device(&mut builder, "dev/sda", EntryType::Block);
        append_dir(&mut builder, "etc/", 0o755);
        append_file(&mut builder, "etc/hostname", 0o644, b"ubuntu\n");
        append_dir(&mut builder, "proc/", 0o555);
        builder.into_inner().expect("finish tar")
    }

    #[test]
    fn test_is_device() {
        assert!(is_device(EntryType::Char));
        assert!(is_device(EntryType::Block));
        assert!(!is_device(EntryType::Regular));
        assert!(!is_device(EntryType::Symlink));
        assert!(!is_device(EntryType::Fifo));
    }

    #[test]
    fn test_unpack_skips_device_entries() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let dest = temp_dir.path();

        let stats = unpack_filtered(sample_tar().as_slice(), dest).expect("unpack");

        assert_eq!(stats.skipped_devices, 2);
        assert_eq!(stats.skipped_unsafe, 0);
        assert_eq!(stats.unpacked, 6);
        assert!(dest.join("dev").is_dir());
        assert!(fs::symlink_metadata(dest.join("dev/null")).is_err());
        assert!(fs::symlink_metadata(dest.join("dev/sda")).is_err());
        assert_eq!(
            fs::read_to_string(dest.join("etc/hostname")).expect("read"),
            "ubuntu\n"
        );
    }

    #[test]
    fn test_unpack_preserves_modes() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let dest = temp_dir.path();

        unpack_filtered(sample_tar().as_slice(), dest).expect("unpack");

        let bash = fs::metadata(dest.join("bin/bash")).expect("metadata");
        assert_eq!(bash.permissions().mode() & 0o777, 0o755);
        let proc_dir = fs::metadata(dest.join("proc")).expect("metadata");
        assert_eq!(proc_dir.permissions().mode() & 0o777, 0o555);
    }

    #[test]
    fn test_extract_tar_xz_file() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let archive = temp_dir.path().join("rootfs.tar.xz");
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(&sample_tar()).expect("compress");
        fs::write(&archive, encoder.finish().expect("finish xz")).expect("write archive");

        let dest = temp_dir.path().join("rootfs");
        fs::create_dir(&dest).expect("mkdir");
        let stats = extract_tar_xz(&archive, &dest).expect("extract");

        assert_eq!(stats.skipped_devices, 2);
        assert!(dest.join("bin/bash").is_file());
    }

    #[test]
    fn test_extract_rejects_corrupt_archive() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let archive = temp_dir.path().join("rootfs.tar.xz");
        fs::write(&archive, b"definitely not xz").expect("write archive");

        let result = extract_tar_xz(&archive, temp_dir.path());
        assert!(result.is_err());
    }
}
