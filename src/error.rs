//! Error types for proot-ubuntu.
//!
//! Uses thiserror for deriving std::error::Error and miette for rich diagnostics.
//! Everything surfaced through [`Error`] is fatal; non-fatal conditions are
//! logged where they happen and never reach this module.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the application.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Host does not meet the requirements for running PRoot
    #[error("Host requirements check failed")]
    #[diagnostic(code(proot_ubuntu::host))]
    HostCheck(#[from] HostCheckError),

    /// A download failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    /// Installing the root filesystem failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Install(#[from] InstallError),

    /// Launching PRoot failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Launch(#[from] LaunchError),
}

/// Errors related to host requirements validation.
#[derive(Error, Debug, Diagnostic)]
pub enum HostCheckError {
    /// The default PRoot build does not run on this architecture
    #[error("Architecture {found} is not supported by the default PRoot build ({required})")]
    #[diagnostic(
        code(proot_ubuntu::host::architecture),
        help("Pass --proot-url with a PRoot build for {found}, or --skip-checks")
    )]
    UnsupportedArchitecture { found: String, required: String },

    /// ptrace is disabled system-wide
    #[error("ptrace is disabled on this host (kernel.yama.ptrace_scope = {scope})")]
    #[diagnostic(
        code(proot_ubuntu::host::ptrace),
        help("PRoot needs ptrace; a reboot is required after ptrace_scope is set to 3")
    )]
    PtraceDisabled { scope: u32 },

    /// Failed to read system information
    #[error("Failed to read system information: {context}")]
    #[diagnostic(code(proot_ubuntu::host::read_failed))]
    ReadFailed {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while downloading a file.
#[derive(Error, Debug, Diagnostic)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("Invalid download URL {url}: {reason}")]
    #[diagnostic(code(proot_ubuntu::fetch::url))]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client")]
    #[diagnostic(code(proot_ubuntu::fetch::client))]
    Client(#[source] reqwest::Error),

    /// The request failed or returned a non-success status
    #[error("Download of {url} failed")]
    #[diagnostic(
        code(proot_ubuntu::fetch::request),
        help("Check network connectivity; nothing has been extracted")
    )]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Writing the downloaded data failed
    #[error("Download of {url} failed: {context}")]
    #[diagnostic(code(proot_ubuntu::fetch::io))]
    Io {
        url: String,
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the root filesystem installer.
#[derive(Error, Debug, Diagnostic)]
pub enum InstallError {
    /// The install directory could not be created
    #[error("Failed to create root filesystem directory {}", path.display())]
    #[diagnostic(code(proot_ubuntu::install::create_dir))]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be fetched
    #[error("Failed to fetch root filesystem archive")]
    #[diagnostic(code(proot_ubuntu::install::fetch))]
    Fetch(#[from] FetchError),

    /// Unpacking the archive failed
    #[error("Extraction of {} failed", archive.display())]
    #[diagnostic(
        code(proot_ubuntu::install::extract),
        help("The partial tree was removed; the archive was kept for inspection")
    )]
    Extract {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while starting PRoot.
#[derive(Error, Debug, Diagnostic)]
pub enum LaunchError {
    /// The PRoot process could not be spawned
    #[error("Failed to start {}", program.display())]
    #[diagnostic(
        code(proot_ubuntu::launch::spawn),
        help("Make sure the PRoot binary exists and is executable")
    )]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
