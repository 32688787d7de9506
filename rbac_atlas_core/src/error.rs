//! Crate-wide error type: a small `Context<K>` wrapper, a closed `ErrorKind`
//! enum carrying the display data, and a crate-wide
//! `Result<T> = std::result::Result<T, failure::Error>` alias.

use std::fmt::{self, Display};

use failure::{Backtrace, Context, Fail};

/// Every distinct failure mode this crate's stages can produce.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "could not classify source '{}': no resolver applies", _0)]
    InvalidSource(String),

    #[fail(display = "remote source '{}' is not a supported yaml document (must end in .yaml/.yml)", _0)]
    UnsupportedRemoteType(String),

    #[fail(display = "failed to fetch remote source '{}': {}", _0, _1)]
    RemoteFetchFailed(String, String),

    #[fail(display = "remote source '{}' returned HTTP {}", _1, _0)]
    BadHttpStatus(u16, String),

    #[fail(display = "invalid yaml in '{}': {}", _0, _1)]
    InvalidYaml(String, String),

    #[fail(display = "failed to render manifests from '{}': {}", _0, _1)]
    RenderFailed(String, String),

    #[fail(display = "failed to extract {} view: {}", _0, _1)]
    ExtractionFailed(String, String),

    #[fail(display = "embedded risk catalog is invalid: {}", _0)]
    InvalidCatalog(String),

    #[fail(display = "invalid role type '{}': must be Role or ClusterRole", _0)]
    InvalidRoleType(String),

    #[fail(display = "operation was cancelled")]
    Cancelled,

    #[fail(display = "io error at '{}': {}", _0, _1)]
    IoError(String, String),
}

/// Crate-wide error, wrapping an [`ErrorKind`] with a backtrace the way the
/// teacher's per-module error structs do.
#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { inner: Context::new(kind) }
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Error {
        Error { inner }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        ErrorKind::IoError(String::new(), e.to_string()).into()
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        ErrorKind::InvalidYaml(String::new(), e.to_string()).into()
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        ErrorKind::RemoteFetchFailed(url, e.to_string()).into()
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Error {
        let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
        ErrorKind::IoError(path, e.to_string()).into()
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, failure::Error>;

/// Convenience: lift an [`ErrorKind`] straight into the crate's `failure::Error`.
pub fn err<T>(kind: ErrorKind) -> Result<T> {
    Err(Error::from(kind).into())
}
