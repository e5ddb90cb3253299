//! Request body providers.
//!
//! A [`BodyProvider`] declares a content type, opens a fresh byte stream on
//! demand and receives upload progress from the executor.

mod form;
mod multipart;
mod stream;
mod text;

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::io::AsyncRead;

pub use form::FormBody;
pub use multipart::{MultipartBody, NamedFileStream};
pub use stream::StreamBody;
pub use text::TextBody;

use crate::error::Result;

/// A readable body stream.
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// Progress observer: `(bytes_so_far, total_if_known)`.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Completion observer: total bytes transferred.
pub type CompletedFn = Arc<dyn Fn(u64) + Send + Sync>;

/// An opened body: the reader positioned at its start, plus its length if known.
pub struct BodySource {
    reader: BodyReader,
    len:    Option<u64>,
}

impl BodySource {
    pub fn new(reader: BodyReader, len: Option<u64>) -> Self { Self { reader, len } }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self::new(Box::new(Cursor::new(bytes)), Some(len))
    }

    pub fn len(&self) -> Option<u64> { self.len }

    pub fn into_parts(self) -> (BodyReader, Option<u64>) { (self.reader, self.len) }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySource")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Supplies the body of a request.
pub trait BodyProvider: Send + Sync {
    fn content_type(&self) -> &str;

    /// Open the body for reading from its first byte.
    ///
    /// Called once per execution. Providers wrapping a single-use stream fail
    /// with [`Error::BodyConsumed`](crate::Error::BodyConsumed) on reuse.
    fn open(&self) -> BoxFuture<'_, Result<BodySource>>;

    /// Called periodically while the body is uploaded.
    fn on_progress(&self, _sent: u64, _total: Option<u64>) {}

    /// Called once after the last body byte was handed to the transport.
    fn on_completed(&self, _total: u64) {}
}

/// Optional upload observers shared by the built-in providers.
#[derive(Clone, Default)]
pub struct ProgressHooks {
    progress:  Option<ProgressFn>,
    completed: Option<CompletedFn>,
}

impl ProgressHooks {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn on_progress(mut self, f: impl Fn(u64, Option<u64>) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_completed(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.completed = Some(Arc::new(f));
        self
    }

    pub(crate) fn progress(&self, sent: u64, total: Option<u64>) {
        if let Some(ref f) = self.progress {
            f(sent, total);
        }
    }

    pub(crate) fn completed(&self, total: u64) {
        if let Some(ref f) = self.completed {
            f(total);
        }
    }
}

impl fmt::Debug for ProgressHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressHooks")
            .field("progress", &self.progress.as_ref().map(|_| "{ ... }"))
            .field("completed", &self.completed.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

#[cfg(test)]
pub(crate) async fn read_all(provider: &dyn BodyProvider) -> Result<(Vec<u8>, Option<u64>)> {
    use tokio::io::AsyncReadExt;

    let (mut reader, len) = provider.open().await?.into_parts();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok((buf, len))
}
