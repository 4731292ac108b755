//! Host requirements checking implementation.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::{BootstrapConfig, DEFAULT_PROOT_ARCH};
use crate::error::HostCheckError;

/// Yama ptrace restriction knob.
pub const PTRACE_SCOPE_PATH: &str = "/proc/sys/kernel/yama/ptrace_scope";

/// `ptrace_scope` value that disables ptrace for everyone.
pub const PTRACE_SCOPE_DISABLED: u32 = 3;

/// Results of all host checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRequirements {
    /// Machine architecture as reported by `uname`
    pub architecture: String,
    /// Yama ptrace scope (`None` if Yama is not enabled)
    pub ptrace_scope: Option<u32>,
}

/// Check all host requirements for `config`.
///
/// Returns the first failing requirement as an error.
pub fn check_all(config: &BootstrapConfig) -> Result<HostRequirements, HostCheckError> {
    let architecture = machine()?;
    check_architecture(&architecture, config)?;
    let ptrace_scope = check_ptrace_scope(Path::new(PTRACE_SCOPE_PATH))?;

    Ok(HostRequirements {
        architecture,
        ptrace_scope,
    })
}

fn machine() -> Result<String, HostCheckError> {
    let uname = nix::sys::utsname::uname().map_err(|e| HostCheckError::ReadFailed {
        context: "uname syscall".to_string(),
        source: io::Error::from_raw_os_error(e as i32),
    })?;

    Ok(uname.machine().to_string_lossy().to_string())
}

/// Check that the configured PRoot binary can run on `architecture`.
///
/// Only the built-in download is known to be x86_64-only; a custom URL is
/// trusted to match the host.
///
/// # Errors
///
/// Returns `HostCheckError::UnsupportedArchitecture` on a mismatch.
pub fn check_architecture(
    architecture: &str,
    config: &BootstrapConfig,
) -> Result<(), HostCheckError> {
    if config.uses_default_proot() && architecture != DEFAULT_PROOT_ARCH {
        return Err(HostCheckError::UnsupportedArchitecture {
            found: architecture.to_string(),
            required: DEFAULT_PROOT_ARCH.to_string(),
        });
    }
    Ok(())
}

/// Check that ptrace has not been disabled system-wide.
///
/// A missing `path` means Yama is not built in, which imposes no
/// restriction.
///
/// # Errors
///
/// Returns `HostCheckError::PtraceDisabled` if the scope is 3, or
/// `HostCheckError::ReadFailed` if the file exists but cannot be parsed.
pub fn check_ptrace_scope(path: &Path) -> Result<Option<u32>, HostCheckError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HostCheckError::ReadFailed {
                context: path.display().to_string(),
                source: e,
            });
        }
    };

    let scope = content
        .trim()
        .parse::<u32>()
        .map_err(|_| HostCheckError::ReadFailed {
            context: format!("Failed to parse ptrace scope: {}", content.trim()),
            source: io::Error::new(io::ErrorKind::InvalidData, "Invalid ptrace scope"),
        })?;

    if scope >= PTRACE_SCOPE_DISABLED {
        return Err(HostCheckError::PtraceDisabled { scope });
    }

    Ok(Some(scope))
}
