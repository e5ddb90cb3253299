use std::fmt;
use std::io::SeekFrom;
use std::sync::{Mutex, PoisonError};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt};

use super::{BodyProvider, BodyReader, BodySource, ProgressHooks};
use crate::effects::stream_len;
use crate::error::{Error, Result};

trait SeekableReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SeekableReader for T {}

enum Source {
    Forward(BodyReader, Option<u64>),
    Seekable(Box<dyn SeekableReader>),
}

/// Passes a caller-provided reader through as the body.
///
/// The reader is consumed by the first execution; opening again fails with
/// [`Error::BodyConsumed`].
pub struct StreamBody {
    source:       Mutex<Option<Source>>,
    content_type: String,
    hooks:        ProgressHooks,
}

impl StreamBody {
    pub const DEFAULT_CONTENT_TYPE: &'static str = "application/octet-stream";

    /// Wrap a forward-only reader of unknown length.
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::from_source(Source::Forward(Box::new(reader), None))
    }

    /// Wrap a forward-only reader whose length is known up front.
    pub fn with_len(reader: impl AsyncRead + Send + Unpin + 'static, len: u64) -> Self {
        Self::from_source(Source::Forward(Box::new(reader), Some(len)))
    }

    /// Wrap a seekable reader; it is rewound and measured when opened.
    pub fn seekable(reader: impl AsyncRead + AsyncSeek + Send + Unpin + 'static) -> Self {
        Self::from_source(Source::Seekable(Box::new(reader)))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source:       Mutex::new(Some(source)),
            content_type: Self::DEFAULT_CONTENT_TYPE.to_string(),
            hooks:        ProgressHooks::default(),
        }
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: ProgressHooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn take(&self) -> Option<Source> { self.source.lock().unwrap_or_else(PoisonError::into_inner).take() }
}

impl fmt::Debug for StreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBody")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl BodyProvider for StreamBody {
    fn content_type(&self) -> &str { &self.content_type }

    fn open(&self) -> BoxFuture<'_, Result<BodySource>> {
        let source = self.take();
        Box::pin(async move {
            match source.ok_or(Error::BodyConsumed)? {
                Source::Forward(reader, len) => Ok(BodySource::new(reader, len)),
                Source::Seekable(mut reader) => {
                    let len = stream_len(&mut reader).await?;
                    reader.seek(SeekFrom::Start(0)).await?;
                    Ok(BodySource::new(Box::new(reader), Some(len)))
                }
            }
        })
    }

    fn on_progress(&self, sent: u64, total: Option<u64>) { self.hooks.progress(sent, total); }

    fn on_completed(&self, total: u64) { self.hooks.completed(total); }
}
