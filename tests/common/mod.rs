//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use proot_ubuntu::BootstrapConfig;
use reqwest::Url;
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;
use xz2::write::XzEncoder;

/// Returns a `file://` URL for an absolute path.
pub fn file_url(path: &Path) -> String {
    Url::from_file_path(path).expect("absolute path").to_string()
}

fn header(entry_type: EntryType, mode: u32, size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header
}

/// Builds an uncompressed tar stream resembling a tiny Ubuntu tree.
pub fn rootfs_tar() -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());

    for dir in ["bin/", "dev/", "etc/", "root/", "usr/", "usr/bin/"] {
        let mut h = header(EntryType::Directory, 0o755, 0);
        builder.append_data(&mut h, dir, io::empty()).expect("dir");
    }

    let bash = b"#!/bin/sh\necho fake bash\n";
    let mut h = header(EntryType::Regular, 0o755, bash.len() as u64);
    builder.append_data(&mut h, "bin/bash", &bash[..]).expect("bash");

    let hostname = b"ubuntu\n";
    let mut h = header(EntryType::Regular, 0o644, hostname.len() as u64);
    builder
        .append_data(&mut h, "etc/hostname", &hostname[..])
        .expect("hostname");

    let mut h = header(EntryType::Symlink, 0o777, 0);
    builder
        .append_link(&mut h, "usr/bin/sh", "../../bin/bash")
        .expect("symlink");

    let mut h = header(EntryType::Symlink, 0o777, 0);
    builder
        .append_link(&mut h, "etc/resolv.conf", "../run/systemd/resolve/stub-resolv.conf")
        .expect("resolv symlink");

    for (path, kind) in [("dev/null", EntryType::Char), ("dev/sda", EntryType::Block)] {
        let mut h = header(kind, 0o666, 0);
        h.set_device_major(1).expect("major");
        h.set_device_minor(3).expect("minor");
        builder.append_data(&mut h, path, io::empty()).expect("device");
    }

    builder.into_inner().expect("finish tar")
}

/// Writes an xz-compressed [`rootfs_tar`] to `path`.
pub fn write_rootfs_archive(path: &Path) {
    let mut encoder = XzEncoder::new(Vec::new(), 6);
    encoder.write_all(&rootfs_tar()).expect("compress");
    fs::write(path, encoder.finish().expect("finish xz")).expect("write archive");
}

/// Writes an executable shell script standing in for PRoot.
///
/// The script records its arguments, one per line, in `args_out` and exits
/// with `exit_code`.
pub fn write_fake_proot(path: &Path, args_out: &Path, exit_code: i32) {
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexit {}\n",
        args_out.display(),
        exit_code
    );
    fs::write(path, script).expect("write fake proot");
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).expect("chmod");
}

/// Temporary layout with local fixtures and a config pointing at them.
pub struct Fixture {
    pub temp: TempDir,
    pub work: PathBuf,
    pub proot_source: PathBuf,
    pub archive_source: PathBuf,
    pub args_out: PathBuf,
    pub config: BootstrapConfig,
}

impl Fixture {
    /// Creates fixtures for a PRoot stand-in exiting with `exit_code`.
    pub fn new(exit_code: i32) -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let sources = temp.path().join("sources");
        let work = temp.path().join("work");
        fs::create_dir(&sources).expect("mkdir sources");
        fs::create_dir(&work).expect("mkdir work");

        let args_out = temp.path().join("proot-args.txt");
        let proot_source = sources.join("proot");
        write_fake_proot(&proot_source, &args_out, exit_code);

        let archive_source = sources.join("rootfs.tar.xz");
        write_rootfs_archive(&archive_source);

        let config = BootstrapConfig::new()
            .with_rootfs_dir(work.join("ubuntu_rootfs"))
            .with_proot_bin(work.join("proot"))
            .with_archive_path(work.join("rootfs.tar.xz"))
            .with_proot_url(file_url(&proot_source))
            .with_rootfs_url(file_url(&archive_source));

        Self {
            temp,
            work,
            proot_source,
            archive_source,
            args_out,
            config,
        }
    }

    /// Deletes the download sources so any further fetch would fail.
    pub fn remove_sources(&self) {
        fs::remove_file(&self.proot_source).expect("remove proot source");
        fs::remove_file(&self.archive_source).expect("remove archive source");
    }
}
