//! Error types shared by every stage of the sync pipeline.
//!
//! Each variant carries the context (URL, path, status) the caller needs to
//! print a useful diagnostic. [`SyncError::kind`] collapses variants into the
//! five failure classes the CLI maps to exit codes.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::auth::CookieError;

/// Failure classes of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing cookie store. Raised before any network traffic.
    CookieLoad,
    /// Non-200 response or transport failure.
    Http,
    /// Unexpected HTML/JSON structure in the library page.
    Parse,
    /// Purchase-detail JSON does not match the expected shape.
    Decode,
    /// Filesystem stat/open/write failure.
    Io,
}

impl ErrorKind {
    /// Returns the stable label used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CookieLoad => "cookie_load",
            Self::Http => "http",
            Self::Parse => "parse",
            Self::Decode => "decode",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while syncing a library.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The cookie store could not be read, parsed or validated.
    #[error("could not load cookie store {path}: {source}")]
    CookieLoad {
        /// Path of the cookie file.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: CookieError,
    },

    /// The server answered with something other than 200.
    #[error("HTTP {status} {reason} fetching {url}")]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// Status code.
        status: u16,
        /// Canonical reason phrase, empty when unknown.
        reason: String,
    },

    /// DNS, connect, TLS or mid-body transport failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("could not build HTTP client: {source}")]
    Client {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A URL could not be built or parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },

    /// The element holding the embedded user data is not in the page.
    #[error("library page has no #{element_id} element")]
    EmbeddedDataMissing {
        /// Element id that was searched for.
        element_id: &'static str,
    },

    /// The embedded user data is not the expected JSON.
    #[error("embedded data in #{element_id} is not valid JSON: {source}")]
    EmbeddedDataInvalid {
        /// Element id the text came from.
        element_id: &'static str,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The purchase-detail response body does not decode.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        /// The requested URL.
        url: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Creates a cookie-load error.
    pub fn cookie_load(path: impl Into<PathBuf>, source: CookieError) -> Self {
        Self::CookieLoad {
            path: path.into(),
            source,
        }
    }

    /// Creates an HTTP status error; the reason phrase is derived from the code.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self::HttpStatus {
            url: url.into(),
            status,
            reason,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a client construction error.
    pub fn client(source: reqwest::Error) -> Self {
        Self::Client { source }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CookieLoad { .. } => ErrorKind::CookieLoad,
            Self::HttpStatus { .. }
            | Self::Network { .. }
            | Self::Client { .. }
            | Self::InvalidUrl { .. } => ErrorKind::Http,
            Self::EmbeddedDataMissing { .. } | Self::EmbeddedDataInvalid { .. } => {
                ErrorKind::Parse
            }
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the HTTP status code for status errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
