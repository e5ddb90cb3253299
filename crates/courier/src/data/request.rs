use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::data::{ActionProvider, AuthProvider, BodyProvider, Header, HeaderProvider, Headers};

/// HTTP methods supported by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// GET and HEAD never carry a request body.
    pub fn allows_body(&self) -> bool { !matches!(self, Method::Get | Method::Head) }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Per-request execution options.
///
/// # Examples
///
/// ```
/// use courier::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::default()
///     .timeout(Duration::from_secs(5))
///     .error_for_status(false);
/// assert_eq!(options.get_timeout(), Some(Duration::from_secs(5)));
/// ```
#[derive(Clone)]
pub struct RequestOptions {
    /// Upper bound for the whole exchange, body upload included.
    ///
    /// Default: None
    pub timeout: Option<Duration>,

    /// Cancels the exchange when triggered; surfaces as `Error::Cancelled`.
    ///
    /// Default: None
    pub cancel: Option<CancellationToken>,

    /// Treat non-2xx responses as failures.
    ///
    /// Default: true
    pub error_for_status: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout:          None,
            cancel:           None,
            error_for_status: true,
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel.is_some())
            .field("error_for_status", &self.error_for_status)
            .finish()
    }
}

impl RequestOptions {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }

    pub fn get_timeout(&self) -> Option<Duration> { self.timeout }
}

/// The not-yet-sent request handed to `on_make` for last-moment changes.
#[derive(Debug, Clone)]
pub struct RawRequest {
    method:  Method,
    url:     Url,
    headers: Headers,
    timeout: Option<Duration>,
}

impl RawRequest {
    pub(crate) fn new(method: Method, url: Url, timeout: Option<Duration>) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            timeout,
        }
    }

    pub fn method(&self) -> Method { self.method }

    pub fn url(&self) -> &Url { &self.url }

    pub fn url_mut(&mut self) -> &mut Url { &mut self.url }

    pub fn headers(&self) -> &Headers { &self.headers }

    /// Append a header sent verbatim.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) { self.headers.push(Header::new(name, value)); }

    pub fn remove_header(&mut self, name: &str) { self.headers.remove(name); }

    pub fn timeout(&self) -> Option<Duration> { self.timeout }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

    pub(crate) fn push(&mut self, header: Header) { self.headers.push(header); }

    pub(crate) fn into_parts(self) -> (Method, Url, Headers, Option<Duration>) { (self.method, self.url, self.headers, self.timeout) }
}

/// A finalized unit of work, produced by
/// [`RequestBuilder::build`](crate::RequestBuilder::build).
///
/// Providers are shared, so dispatching the same `Request` twice runs two
/// independent exchanges.
#[derive(Clone)]
pub struct Request {
    pub(crate) method:  Method,
    pub(crate) url:     Url,
    pub(crate) headers: Option<Arc<dyn HeaderProvider>>,
    pub(crate) auth:    Option<Arc<dyn AuthProvider>>,
    pub(crate) body:    Option<Arc<dyn BodyProvider>>,
    pub(crate) action:  Arc<dyn ActionProvider>,
    pub(crate) options: RequestOptions,
}

impl Request {
    pub fn method(&self) -> Method { self.method }

    pub fn url(&self) -> &Url { &self.url }

    pub fn has_body(&self) -> bool { self.body.is_some() }

    pub fn options(&self) -> &RequestOptions { &self.options }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers.is_some())
            .field("auth", &self.auth.is_some())
            .field("body", &self.body.as_ref().map(|b| b.content_type().to_string()))
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
