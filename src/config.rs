//! Configuration for the bootstrap sequence.

use std::path::PathBuf;

/// Default PRoot release asset (static, x86_64).
pub const DEFAULT_PROOT_URL: &str =
    "https://github.com/ysdragon/proot-static/releases/download/v5.4.0/proot-x86_64-static";

/// Default Ubuntu minimal cloud-image root filesystem.
pub const DEFAULT_ROOTFS_URL: &str = "https://cloud-images.ubuntu.com/minimal/releases/jammy/release/ubuntu-22.04-minimal-cloudimg-amd64-root.tar.xz";

/// Architecture the default PRoot asset is built for.
pub const DEFAULT_PROOT_ARCH: &str = "x86_64";

/// Host paths bound into the guest by default.
pub const DEFAULT_BIND_MOUNTS: &[&str] = &["/dev", "/sys", "/proc", "/etc/resolv.conf"];

/// Configuration for a bootstrap run.
///
/// All paths are used as given, so relative paths resolve against the
/// current working directory.
///
/// # Example
///
/// ```
/// use proot_ubuntu::BootstrapConfig;
///
/// let config = BootstrapConfig::default()
///     .with_rootfs_dir("/tmp/ubuntu")
///     .with_proot_bin("/tmp/proot");
///
/// assert_eq!(config.resolv_conf_path().to_str(), Some("/tmp/ubuntu/etc/resolv.conf"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Where the PRoot binary is downloaded from.
    pub proot_url: String,

    /// Where the root filesystem archive is downloaded from.
    pub rootfs_url: String,

    /// Directory the root filesystem is extracted into.
    pub rootfs_dir: PathBuf,

    /// Location of the PRoot binary.
    pub proot_bin: PathBuf,

    /// Transient location of the downloaded archive.
    pub archive_path: PathBuf,

    /// Initial working directory inside the guest.
    pub guest_workdir: String,

    /// Command run inside the guest.
    pub shell: String,

    /// Host paths bound into the guest at the same location.
    pub bind_mounts: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            proot_url: String::from(DEFAULT_PROOT_URL),
            rootfs_url: String::from(DEFAULT_ROOTFS_URL),
            rootfs_dir: PathBuf::from("./ubuntu_rootfs"),
            proot_bin: PathBuf::from("./proot"),
            archive_path: PathBuf::from("rootfs.tar.xz"),
            guest_workdir: String::from("/root"),
            shell: String::from("/bin/bash"),
            bind_mounts: DEFAULT_BIND_MOUNTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BootstrapConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root filesystem directory.
    #[must_use]
    pub fn with_rootfs_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.rootfs_dir = path.into();
        self
    }

    /// Sets the PRoot binary location.
    #[must_use]
    pub fn with_proot_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.proot_bin = path.into();
        self
    }

    /// Sets the transient archive location.
    #[must_use]
    pub fn with_archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = path.into();
        self
    }

    /// Sets the PRoot download URL.
    #[must_use]
    pub fn with_proot_url(mut self, url: impl Into<String>) -> Self {
        self.proot_url = url.into();
        self
    }

    /// Sets the root filesystem archive URL.
    #[must_use]
    pub fn with_rootfs_url(mut self, url: impl Into<String>) -> Self {
        self.rootfs_url = url.into();
        self
    }

    /// Sets the initial working directory inside the guest.
    #[must_use]
    pub fn with_guest_workdir(mut self, dir: impl Into<String>) -> Self {
        self.guest_workdir = dir.into();
        self
    }

    /// Sets the command run inside the guest.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Replaces the list of bind mounts.
    #[must_use]
    pub fn with_bind_mounts<I, S>(mut self, mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bind_mounts = mounts.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the PRoot URL is the built-in x86_64 asset.
    #[must_use]
    pub fn uses_default_proot(&self) -> bool {
        self.proot_url == DEFAULT_PROOT_URL
    }

    /// Path of the shell probed to decide whether the tree is installed.
    #[must_use]
    pub fn bash_path(&self) -> PathBuf {
        self.rootfs_dir.join("bin").join("bash")
    }

    /// Path of the guest `etc` directory.
    #[must_use]
    pub fn etc_dir(&self) -> PathBuf {
        self.rootfs_dir.join("etc")
    }

    /// Path of the guest resolver configuration.
    #[must_use]
    pub fn resolv_conf_path(&self) -> PathBuf {
        self.etc_dir().join("resolv.conf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BootstrapConfig::default();
        assert_eq!(config.rootfs_dir, PathBuf::from("./ubuntu_rootfs"));
        assert_eq!(config.proot_bin, PathBuf::from("./proot"));
        assert_eq!(config.archive_path, PathBuf::from("rootfs.tar.xz"));
        assert_eq!(config.guest_workdir, "/root");
        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(
            config.bind_mounts,
            vec!["/dev", "/sys", "/proc", "/etc/resolv.conf"]
        );
        assert!(config.uses_default_proot());
    }

    #[test]
    fn test_builder_chain() {
        let config = BootstrapConfig::new()
            .with_rootfs_dir("/srv/rootfs")
            .with_proot_bin("/srv/proot")
            .with_archive_path("/srv/rootfs.tar.xz")
            .with_proot_url("file:///opt/proot")
            .with_rootfs_url("file:///opt/rootfs.tar.xz")
            .with_guest_workdir("/home")
            .with_shell("/bin/sh")
            .with_bind_mounts(["/dev"]);

        assert_eq!(config.rootfs_dir, PathBuf::from("/srv/rootfs"));
        assert_eq!(config.proot_bin, PathBuf::from("/srv/proot"));
        assert_eq!(config.archive_path, PathBuf::from("/srv/rootfs.tar.xz"));
        assert_eq!(config.proot_url, "file:///opt/proot");
        assert_eq!(config.rootfs_url, "file:///opt/rootfs.tar.xz");
        assert_eq!(config.guest_workdir, "/home");
        assert_eq!(config.shell, "/bin/sh");
        assert_eq!(config.bind_mounts, vec!["/dev"]);
        assert!(!config.uses_default_proot());
    }

    #[test]
    fn test_derived_paths() {
        let config = BootstrapConfig::new().with_rootfs_dir("/srv/rootfs");
        assert_eq!(config.bash_path(), PathBuf::from("/srv/rootfs/bin/bash"));
        assert_eq!(config.etc_dir(), PathBuf::from("/srv/rootfs/etc"));
        assert_eq!(
            config.resolv_conf_path(),
            PathBuf::from("/srv/rootfs/etc/resolv.conf")
        );
    }
}
