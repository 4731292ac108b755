//! The setup-then-launch sequence.
//!
//! 1. fetch PRoot and mark it executable
//! 2. install the root filesystem (fetch, extract, DNS)
//! 3. run the guest shell

use std::path::Path;
use std::process::ExitStatus;

use tracing::{info, instrument, warn};

use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::fetch::{FetchOutcome, Fetcher};
use crate::launcher::{LaunchPlan, launch};
use crate::permissions::make_executable;
use crate::rootfs::{InstallOutcome, RootfsInstaller};

/// What the setup steps did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// Result of fetching the PRoot binary.
    pub proot: FetchOutcome,
    /// Whether the PRoot binary was marked executable.
    pub proot_executable: bool,
    /// Result of the root filesystem installation.
    pub rootfs: InstallOutcome,
}

impl SetupReport {
    /// Returns true if anything was downloaded.
    #[must_use]
    pub fn downloaded_anything(&self) -> bool {
        self.proot.downloaded() || self.rootfs.fetch.is_some_and(|f| f.downloaded())
    }
}

/// Fetches PRoot and installs the root filesystem without launching.
///
/// # Errors
///
/// Returns an error if either download or the extraction fails.
#[instrument(skip_all)]
pub fn prepare(config: &BootstrapConfig, fetcher: &Fetcher) -> Result<SetupReport> {
    let proot = fetcher.fetch(&config.proot_url, &config.proot_bin)?;

    let proot_executable = mark_executable(&config.proot_bin);

    let rootfs = RootfsInstaller::new(config, fetcher).install()?;

    Ok(SetupReport {
        proot,
        proot_executable,
        rootfs,
    })
}

/// Marks the PRoot binary executable. A failure is logged, not returned.
fn mark_executable(proot_bin: &Path) -> bool {
    match make_executable(proot_bin) {
        Ok(_) => {
            info!("Granted execution permissions to PRoot.");
            true
        }
        Err(e) => {
            warn!("Failed to mark {} executable: {e}", proot_bin.display());
            false
        }
    }
}

/// Runs the whole sequence and returns the guest's exit status.
///
/// # Errors
///
/// Returns an error if setup fails or PRoot cannot be started.
pub fn run(config: &BootstrapConfig, fetcher: &Fetcher) -> Result<ExitStatus> {
    prepare(config, fetcher)?;
    let status = launch(&LaunchPlan::from_config(config))?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_mark_executable_sets_owner_exec() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("proot");
        fs::write(&path, b"#!/bin/sh\n").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        assert!(mark_executable(&path));
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o100, 0o100);
    }

    #[test]
    fn test_mark_executable_failure_is_not_fatal() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let missing = temp_dir.path().join("missing-proot");

        assert!(!mark_executable(&missing));
    }
}
