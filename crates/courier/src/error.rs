//! Error types for courier.

use std::io;

use thiserror::Error;

use crate::data::Method;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request URL is empty")]
    EmptyUrl,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{method} requests cannot carry a body")]
    BodyNotAllowed { method: Method },

    #[error("no Tokio runtime is available to run the request")]
    NoRuntime,

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("body stream was already consumed")]
    BodyConsumed,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("upload body failed: {0}")]
    Body(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("file sink error: {0}")]
    Fs(#[from] courier_fs::Error),

    #[error("callback failed: {0}")]
    Callback(String),

    #[error("request task failed: {0}")]
    Join(String),
}

impl Error {
    /// Caller mistakes detected before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::EmptyUrl
                | Error::InvalidUrl(_)
                | Error::BodyNotAllowed { .. }
                | Error::NoRuntime
                | Error::Serialize(_)
        )
    }

    /// Failures of the exchange itself, delivered through `on_fail`.
    ///
    /// A deadline or cancellation that fires while a success handler reads
    /// the response body is returned by that handler instead.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Connect(_)
                | Error::Network(_)
                | Error::Timeout
                | Error::Cancelled
                | Error::Status { .. }
                | Error::BodyConsumed
                | Error::Body(_)
        )
    }

    /// Wrap an arbitrary callback error.
    pub fn callback(err: impl std::fmt::Display) -> Self { Error::Callback(err.to_string()) }
}

/// I/O errors carrying [`Error::Timeout`] or [`Error::Cancelled`] convert
/// back to that variant; everything else becomes [`Error::Io`].
impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()) {
            Some(Error::Timeout) => Error::Timeout,
            Some(Error::Cancelled) => Error::Cancelled,
            _ => Error::Io(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self { Error::Serialize(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
