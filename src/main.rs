//! proot-ubuntu - Entry Point
//!
//! Sets up the Ubuntu root filesystem and drops into a shell inside it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use proot_ubuntu::config::{DEFAULT_PROOT_URL, DEFAULT_ROOTFS_URL};
use proot_ubuntu::fetch::Fetcher;
use proot_ubuntu::launcher::{LaunchPlan, exit_code, launch};
use proot_ubuntu::{BootstrapConfig, bootstrap, system};

/// Run a minimal Ubuntu userland under PRoot without root privileges.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the root filesystem is installed into
    #[arg(long, env = "PROOT_UBUNTU_ROOTFS_DIR", default_value = "./ubuntu_rootfs")]
    rootfs_dir: PathBuf,

    /// Location of the PRoot binary
    #[arg(long, env = "PROOT_UBUNTU_PROOT_BIN", default_value = "./proot")]
    proot_bin: PathBuf,

    /// Where the root filesystem archive is downloaded to
    #[arg(long, env = "PROOT_UBUNTU_ARCHIVE", default_value = "rootfs.tar.xz")]
    archive_path: PathBuf,

    /// URL of the static PRoot binary
    #[arg(long, env = "PROOT_UBUNTU_PROOT_URL", default_value = DEFAULT_PROOT_URL)]
    proot_url: String,

    /// URL of the root filesystem archive (tar.xz)
    #[arg(long, env = "PROOT_UBUNTU_ROOTFS_URL", default_value = DEFAULT_ROOTFS_URL)]
    rootfs_url: String,

    /// Prepare the root filesystem but do not start the shell
    #[arg(long, default_value = "false")]
    setup_only: bool,

    /// Skip host requirements checks
    #[arg(long, default_value = "false")]
    skip_checks: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

impl Args {
    fn config(&self) -> BootstrapConfig {
        BootstrapConfig::new()
            .with_rootfs_dir(&self.rootfs_dir)
            .with_proot_bin(&self.proot_bin)
            .with_archive_path(&self.archive_path)
            .with_proot_url(&self.proot_url)
            .with_rootfs_url(&self.rootfs_url)
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // Keep stdout free for the guest shell
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = args.config();

    if args.skip_checks {
        warn!("Skipping host requirements checks (--skip-checks).");
    } else {
        match system::check_all(&config) {
            Ok(reqs) => {
                info!(
                    "Host requirements satisfied: arch {}, ptrace_scope {:?}",
                    reqs.architecture, reqs.ptrace_scope
                );
            }
            Err(e) => {
                error!("Host requirements check failed");
                return Err(e.into());
            }
        }
    }

    let fetcher = Fetcher::new()?;
    let report = match bootstrap::prepare(&config, &fetcher) {
        Ok(report) => report,
        Err(e) => {
            error!("Setup failed");
            return Err(e.into());
        }
    };

    if args.setup_only {
        info!(
            downloaded = report.downloaded_anything(),
            rootfs = %config.rootfs_dir.display(),
            "Setup complete, not launching (--setup-only)"
        );
        return Ok(ExitCode::SUCCESS);
    }

    let status = launch(&LaunchPlan::from_config(&config))?;
    Ok(ExitCode::from(exit_code(status)))
}
