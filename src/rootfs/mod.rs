//! Installation of the Ubuntu root filesystem.
//!
//! The installer drives the root filesystem directory through these states:
//!
//! ```text
//! Broken ──remove──▶ Absent ──mkdir──▶ Empty ──fetch+extract──▶ Installed
//!                                                                   │
//!                         Installed (already valid) ───────────────▶│
//!                                                                   ▼
//!                                                     write etc/resolv.conf
//! ```
//!
//! Running the installer against a valid tree performs no network activity
//! and only rewrites the resolver configuration.
//!
//! # Example
//!
//! ```no_run
//! use proot_ubuntu::BootstrapConfig;
//! use proot_ubuntu::fetch::Fetcher;
//! use proot_ubuntu::rootfs::RootfsInstaller;
//!
//! let config = BootstrapConfig::default();
//! let fetcher = Fetcher::new().unwrap();
//! let outcome = RootfsInstaller::new(&config, &fetcher).install().unwrap();
//! assert!(outcome.dns_written);
//! ```

mod cleanup;
mod dns;
mod extract;
mod state;

pub use cleanup::{RemovalReport, remove_tree};
pub use dns::{NAMESERVERS, resolv_conf_contents, write_resolv_conf};
pub use extract::{ExtractStats, extract_tar_xz, is_device, unpack_filtered};
pub use state::RootfsState;

use std::fs;

use tracing::{error, info, instrument, warn};

use crate::config::BootstrapConfig;
use crate::error::InstallError;
use crate::fetch::{FetchOutcome, Fetcher};

/// What a call to [`RootfsInstaller::install`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// State observed before anything was changed.
    pub initial_state: RootfsState,
    /// Whether a broken tree was removed first.
    pub removed_broken: bool,
    /// Result of fetching the archive, if an install was needed.
    pub fetch: Option<FetchOutcome>,
    /// Extraction counters, if an install was needed.
    pub extract: Option<ExtractStats>,
    /// Whether `etc/resolv.conf` was written.
    pub dns_written: bool,
}

impl InstallOutcome {
    /// Returns true if the archive was unpacked during this call.
    #[must_use]
    pub fn extracted(&self) -> bool {
        self.extract.is_some()
    }
}

/// Installs the root filesystem described by a [`BootstrapConfig`].
#[derive(Debug)]
pub struct RootfsInstaller<'a> {
    config: &'a BootstrapConfig,
    fetcher: &'a Fetcher,
}

impl<'a> RootfsInstaller<'a> {
    /// Creates an installer for `config`, downloading through `fetcher`.
    #[must_use]
    pub fn new(config: &'a BootstrapConfig, fetcher: &'a Fetcher) -> Self {
        Self { config, fetcher }
    }

    /// Brings the root filesystem to a usable state.
    ///
    /// # Errors
    ///
    /// Returns `InstallError` if the directory cannot be created, the
    /// archive cannot be fetched, or extraction fails. A failed extraction
    /// removes the partially extracted tree and keeps the archive.
    #[instrument(skip(self), fields(rootfs = %self.config.rootfs_dir.display()))]
    pub fn install(&self) -> Result<InstallOutcome, InstallError> {
        let rootfs = &self.config.rootfs_dir;
        let initial_state = RootfsState::probe(self.config);

        let mut outcome = InstallOutcome {
            initial_state,
            removed_broken: false,
            fetch: None,
            extract: None,
            dns_written: false,
        };

        if initial_state == RootfsState::Broken {
            info!("Broken installation detected. Removing and reinstalling...");
            let report = remove_tree(rootfs);
            if !report.is_complete() {
                warn!(
                    failed = report.failed,
                    "Some entries of the broken installation could not be removed"
                );
            }
            outcome.removed_broken = true;
        }

        if !rootfs.exists() {
            fs::create_dir_all(rootfs).map_err(|e| InstallError::CreateDir {
                path: rootfs.clone(),
                source: e,
            })?;
        }

        if !RootfsState::probe(self.config).needs_install() {
            info!("Ubuntu is already installed.");
        } else {
            outcome.fetch = Some(
                self.fetcher
                    .fetch(&self.config.rootfs_url, &self.config.archive_path)?,
            );
            outcome.extract = Some(self.extract()?);
        }

        info!("Configuring DNS...");
        match write_resolv_conf(rootfs) {
            Ok(()) => {
                info!("DNS configuration updated.");
                outcome.dns_written = true;
            }
            Err(e) => warn!("Failed to update DNS: {e}"),
        }

        Ok(outcome)
    }

    fn extract(&self) -> Result<ExtractStats, InstallError> {
        let archive = &self.config.archive_path;
        let rootfs = &self.config.rootfs_dir;

        info!("Extracting Ubuntu...");
        let stats = match extract_tar_xz(archive, rootfs) {
            Ok(stats) => stats,
            Err(e) => {
                error!("Extraction error: {e}");
                let report = remove_tree(rootfs);
                if !report.is_complete() {
                    warn!(
                        failed = report.failed,
                        "Some entries of the partial extraction could not be removed"
                    );
                }
                return Err(InstallError::Extract {
                    archive: archive.clone(),
                    source: e,
                });
            }
        };

        info!(
            unpacked = stats.unpacked,
            skipped_devices = stats.skipped_devices,
            "Extraction complete!"
        );

        if let Err(e) = fs::remove_file(archive) {
            warn!("Failed to remove {}: {e}", archive.display());
        }

        Ok(stats)
    }
}
