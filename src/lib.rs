//! proot-ubuntu - Run a minimal Ubuntu userland under PRoot.
//!
//! This crate bootstraps an Ubuntu root filesystem in the current directory
//! and starts an interactive shell inside it through PRoot, a user-space
//! `chroot`/`mount --bind` emulator that needs no privileges.
//!
//! # Layout
//!
//! ```text
//! ./proot                          # static PRoot binary
//! ./ubuntu_rootfs/                 # extracted root filesystem
//! ./ubuntu_rootfs/etc/resolv.conf  # rewritten on every run
//! ./rootfs.tar.xz                  # transient download
//! ```
//!
//! # Example
//!
//! ```no_run
//! use proot_ubuntu::{BootstrapConfig, bootstrap, fetch::Fetcher, system};
//!
//! fn main() -> miette::Result<()> {
//!     let config = BootstrapConfig::default();
//!     system::check_all(&config)?;
//!
//!     let fetcher = Fetcher::new()?;
//!     let status = bootstrap::run(&config, &fetcher)?;
//!     println!("shell exited with {status}");
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fetch;
pub mod launcher;
pub mod permissions;
pub mod rootfs;
pub mod system;

// Re-export commonly used types
pub use bootstrap::SetupReport;
pub use config::BootstrapConfig;
pub use error::{Error, Result};
pub use launcher::LaunchPlan;
