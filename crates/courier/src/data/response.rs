use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::io::StreamReader;
use url::Url;

use crate::data::Headers;
use crate::effects::BoxStream;

/// Byte stream of a response body.
pub type ResponseStream = BoxStream<'static, io::Result<Bytes>>;

/// Status line and headers of a received response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status:  u16,
    url:     Url,
    headers: Headers,
}

impl ResponseHead {
    pub fn new(status: u16, url: Url, headers: Headers) -> Self { Self { status, url, headers } }

    pub fn status(&self) -> u16 { self.status }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn url(&self) -> &Url { &self.url }

    pub fn headers(&self) -> &Headers { &self.headers }

    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }

    pub fn content_length(&self) -> Option<u64> { self.headers.content_length() }
}

/// A response body, readable as [`AsyncRead`].
///
/// Owned by the success callback; dropping it releases the connection.
pub struct ResponseBody {
    inner: StreamReader<ResponseStream, Bytes>,
}

impl ResponseBody {
    pub fn new(stream: ResponseStream) -> Self {
        Self {
            inner: StreamReader::new(stream),
        }
    }

    /// A body backed by an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let chunk: io::Result<Bytes> = Ok(bytes.into());
        Self::new(Box::pin(futures_util::stream::iter([chunk])))
    }

    /// Read the whole body into memory.
    pub async fn bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Read the whole body as UTF-8, replacing invalid sequences.
    pub async fn text(self) -> io::Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

impl AsyncRead for ResponseBody {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("ResponseBody").finish_non_exhaustive() }
}
