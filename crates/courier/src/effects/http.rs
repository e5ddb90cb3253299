use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use url::Url;

use crate::data::{Headers, Method, RawRequest, ResponseBody, ResponseHead, ResponseStream};
use crate::error::Result;

/// A boxed, sendable stream.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Byte stream of an outgoing request body.
pub type RequestStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Request body as handed to a [`Transport`].
pub struct TransportBody {
    pub stream: RequestStream,
    /// Known length, sent as `Content-Length` when present.
    pub len:    Option<u64>,
}

impl TransportBody {
    pub fn new(stream: RequestStream, len: Option<u64>) -> Self { Self { stream, len } }

    /// Drain the body into memory.
    pub async fn collect(self) -> io::Result<Vec<u8>> {
        self.stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
    }
}

impl fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportBody").field("len", &self.len).finish_non_exhaustive()
    }
}

/// A fully resolved request, ready for the wire.
#[derive(Debug)]
pub struct TransportRequest {
    pub method:  Method,
    pub url:     Url,
    pub headers: Headers,
    pub body:    Option<TransportBody>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub(crate) fn from_raw(raw: RawRequest, body: Option<TransportBody>) -> Self {
        let (method, url, headers, timeout) = raw.into_parts();
        Self {
            method,
            url,
            headers,
            body,
            timeout,
        }
    }
}

/// A received response whose body has not been read yet.
pub struct TransportResponse {
    pub status:  u16,
    /// Final URL after redirects.
    pub url:     Url,
    pub headers: Headers,
    pub body:    ResponseStream,
}

impl TransportResponse {
    pub fn new(status: u16, url: Url, headers: Headers, body: ResponseStream) -> Self {
        Self {
            status,
            url,
            headers,
            body,
        }
    }

    /// A response with an in-memory body.
    pub fn from_bytes(status: u16, url: Url, headers: Headers, body: impl Into<Bytes>) -> Self {
        let chunk: io::Result<Bytes> = Ok(body.into());
        Self::new(status, url, headers, Box::pin(futures_util::stream::iter([chunk])))
    }

    pub fn into_parts(self) -> (ResponseHead, ResponseBody) {
        (ResponseHead::new(self.status, self.url, self.headers), ResponseBody::new(self.body))
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The wire-level HTTP exchange.
///
/// Implementations send the request, stream its body if any, and return as
/// soon as the response head is available. Redirects, connection reuse and
/// TLS are their business. Errors must be mapped onto the crate's
/// transport variants ([`Error::Connect`](crate::Error::Connect),
/// [`Error::Network`](crate::Error::Network),
/// [`Error::Timeout`](crate::Error::Timeout)).
///
/// # Implementations
///
/// - [`ReqwestTransport`]: production implementation using `reqwest`
/// - Mock implementations for testing
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> impl Future<Output = Result<TransportResponse>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;
    use crate::data::{ClientOptions, Header};
    use crate::error::Error;

    /// Production transport backed by a shared `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Build a transport from connection-level options.
        ///
        /// # Errors
        ///
        /// Fails when the underlying client cannot be constructed, e.g. when
        /// the TLS backend cannot initialize.
        pub fn with_options(options: &ClientOptions) -> Result<Self> {
            let redirect = if options.max_redirects == 0 {
                reqwest::redirect::Policy::none()
            } else {
                reqwest::redirect::Policy::limited(options.max_redirects)
            };

            let mut builder = reqwest::Client::builder()
                .user_agent(options.user_agent.clone())
                .connect_timeout(options.connect_timeout)
                .redirect(redirect);
            if let Some(timeout) = options.timeout {
                builder = builder.timeout(timeout);
            }

            let client = builder.build().map_err(|e| Error::Network(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an already configured client.
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    fn to_reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }

    fn map_error(err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Connect(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }

    /// Body read errors; timeouts keep their meaning through `io::Error`.
    fn body_error(err: reqwest::Error) -> io::Error {
        if err.is_timeout() {
            io::Error::new(io::ErrorKind::TimedOut, Error::Timeout)
        } else {
            io::Error::other(err)
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            let TransportRequest {
                method,
                url,
                headers,
                body,
                timeout,
            } = request;

            let mut builder = self.client.request(to_reqwest_method(method), url);
            for header in headers {
                let (name, value) = header.into_parts();
                builder = builder.header(name, value);
            }
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(body) = body {
                if let Some(len) = body.len {
                    builder = builder.header(reqwest::header::CONTENT_LENGTH, len);
                }
                builder = builder.body(reqwest::Body::wrap_stream(body.stream));
            }

            let response = builder.send().await.map_err(map_error)?;

            let status = response.status().as_u16();
            let url = response.url().clone();
            let headers: Headers = response
                .headers()
                .iter()
                .map(|(name, value)| Header::new(name.as_str(), String::from_utf8_lossy(value.as_bytes())))
                .collect();
            let stream = response.bytes_stream().map(|chunk| chunk.map_err(body_error));

            Ok(TransportResponse::new(status, url, headers, Box::pin(stream)))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
