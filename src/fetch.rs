//! Downloading of the PRoot binary and the root filesystem archive.
//!
//! Downloads are skipped when the destination already exists. Data is
//! streamed into a `<dest>.part` sibling and renamed into place once the
//! transfer has completed, so an interrupted download never leaves a
//! truncated file where a later run would mistake it for a finished one.
//!
//! Besides `http`/`https`, `file://` URLs are accepted and copied from the
//! local filesystem.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, ClientBuilder};
use tracing::{debug, info, instrument};

use crate::error::FetchError;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Suffix of the file a download is streamed into.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Result of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination existed; nothing was fetched.
    AlreadyPresent,
    /// The file was fetched.
    Downloaded {
        /// Number of bytes written.
        bytes: u64,
    },
}

impl FetchOutcome {
    /// Returns true if data was actually transferred.
    #[must_use]
    pub fn downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }
}

/// Returns a client builder preconfigured with the User-Agent and no timeout.
#[must_use]
pub fn client_builder() -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None::<Duration>)
}

/// Returns the path a download to `dest` is streamed into.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Blocking downloader.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the default HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        let client = client_builder().build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Creates a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` to `dest` unless `dest` already exists.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` if the URL is invalid, the request fails or
    /// returns a non-success status, or the data cannot be written.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        if dest.exists() {
            info!("{} already exists.", dest.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!("Downloading: {url} ...");
        let partial = partial_path(dest);
        let result = match parsed.scheme() {
            "file" => copy_local(&parsed, url, &partial),
            "http" | "https" => self.download(url, &partial),
            other => Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        };

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&partial) {
                    debug!(path = %partial.display(), error = %rm, "No partial download to remove");
                }
                return Err(e);
            }
        };

        fs::rename(&partial, dest).map_err(|e| FetchError::Io {
            url: url.to_string(),
            context: format!("failed to move download into {}", dest.display()),
            source: e,
        })?;

        info!(bytes, "Download complete!");
        Ok(FetchOutcome::Downloaded { bytes })
    }

    fn download(&self, url: &str, partial: &Path) -> Result<u64, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source: e,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(request_error)?;

        debug!(status = %response.status(), length = ?response.content_length(), "Response received");

        let mut file = File::create(partial).map_err(|e| FetchError::Io {
            url: url.to_string(),
            context: format!("failed to create {}", partial.display()),
            source: e,
        })?;

        response.copy_to(&mut file).map_err(request_error)
    }
}

fn copy_local(parsed: &Url, url: &str, partial: &Path) -> Result<u64, FetchError> {
    let source = parsed
        .to_file_path()
        .map_err(|()| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "not a local file path".to_string(),
        })?;

    fs::copy(&source, partial).map_err(|e| FetchError::Io {
        url: url.to_string(),
        context: format!("failed to copy {}", source.display()),
        source: e,
    })
}
