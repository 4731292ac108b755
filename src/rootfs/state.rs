//! Probing of the root filesystem directory.

use std::fmt;

use crate::config::BootstrapConfig;

/// State of the root filesystem directory as seen from the host.
///
/// The probe is shallow: it only looks for `bin/bash` and `etc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootfsState {
    /// The directory does not exist.
    Absent,
    /// The directory exists but has no `etc`; left over from a failed install.
    Broken,
    /// The directory exists with `etc` but without a shell.
    Incomplete,
    /// Both `bin/bash` and `etc` are present.
    Installed,
}

impl RootfsState {
    /// Inspects the directory configured in `config`.
    #[must_use]
    pub fn probe(config: &BootstrapConfig) -> Self {
        if !config.rootfs_dir.exists() {
            return Self::Absent;
        }

        let has_etc = config.etc_dir().exists();
        if !has_etc {
            return Self::Broken;
        }

        if config.bash_path().exists() {
            Self::Installed
        } else {
            Self::Incomplete
        }
    }

    /// Returns true if the archive has to be fetched and extracted.
    #[must_use]
    pub fn needs_install(&self) -> bool {
        !matches!(self, Self::Installed)
    }
}

impl fmt::Display for RootfsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Broken => "broken",
            Self::Incomplete => "incomplete",
            Self::Installed => "installed",
        };
        f.write_str(name)
    }
}
