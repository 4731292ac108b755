//! Starting the guest shell under PRoot.
//!
//! The launcher builds PRoot's argument vector, runs it as a child with the
//! terminal's stdin/stdout/stderr, and blocks until it exits. PRoot's own
//! behaviour (syscall translation, bind emulation) is opaque here.

use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info, instrument, warn};

use crate::config::BootstrapConfig;
use crate::error::LaunchError;

/// Program and arguments used to start the guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Path of the PRoot binary.
    pub program: PathBuf,
    /// Arguments passed to PRoot.
    pub args: Vec<OsString>,
}

impl LaunchPlan {
    /// Builds the PRoot invocation for `config`.
    ///
    /// ```text
    /// proot --rootfs=<dir> -0 -w <workdir> -b <bind>... <shell>
    /// ```
    #[must_use]
    pub fn from_config(config: &BootstrapConfig) -> Self {
        let mut rootfs_arg = OsString::from("--rootfs=");
        rootfs_arg.push(config.rootfs_dir.as_os_str());

        let mut args = vec![
            rootfs_arg,
            OsString::from("-0"),
            OsString::from("-w"),
            OsString::from(&config.guest_workdir),
        ];
        for bind in &config.bind_mounts {
            args.push(OsString::from("-b"));
            args.push(OsString::from(bind));
        }
        args.push(OsString::from(&config.shell));

        Self {
            program: config.proot_bin.clone(),
            args,
        }
    }

    /// Returns a `Command` for this plan with inherited standard streams.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }
}

/// Runs `plan` and waits for it to exit.
///
/// Whatever exit status the child reports is returned as-is; only a failure
/// to spawn is an error.
///
/// # Errors
///
/// Returns `LaunchError::Spawn` if the process cannot be started.
#[instrument(skip(plan), fields(program = %plan.program.display()))]
pub fn launch(plan: &LaunchPlan) -> Result<ExitStatus, LaunchError> {
    info!("Starting Ubuntu...");
    info!("--- Terminal Mode ---");
    debug!(args = ?plan.args, "Spawning PRoot");

    let status = plan
        .command()
        .status()
        .map_err(|e| LaunchError::Spawn {
            program: plan.program.clone(),
            source: e,
        })?;

    if status.success() {
        info!("Process exited: {status}");
    } else {
        warn!("Process exited: {status}");
    }
    Ok(status)
}

/// Maps a child's exit status to this process's exit code.
///
/// A normal exit keeps the child's code; death by signal maps to
/// `128 + signal` the way shells report it.
#[must_use]
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }
    match status.signal() {
        Some(signal) => (128 + signal).clamp(0, 255) as u8,
        None => 1,
    }
}
