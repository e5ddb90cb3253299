use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use courier_fs::LocalFs;
use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{Client, RequestHandle};
use crate::data::{
    ActionProvider, AuthProvider, BasicAuth, BodyProvider, FailFn, FormBody, HeaderProvider, MakeFn, MapHeaders,
    Method, MultipartBody, NamedFileStream, ObjectHeaders, ProgressHooks, RawAuth, RawRequest, Request,
    RequestOptions, ResponseBody, ResponseHead, SettableAction, StreamBody, SuccessFn, TextBody,
};
use crate::effects::Transport;
use crate::effects::download::{Download, append_handler};
use crate::error::{Error, Result};

/// Fluent configuration of a single request.
///
/// Obtained from the verb methods of [`Client`] or the crate-level
/// functions. Setting a provider twice replaces the earlier one. Methods
/// that attach a body fail with [`Error::BodyNotAllowed`] on GET and HEAD.
///
/// # Examples
///
/// ```no_run
/// # async fn run() -> courier::Result<()> {
/// courier::post("https://example.com/login")
///     .basic_auth("user", "secret")
///     .form([("remember", "yes")])?
///     .on_success_text(|head, text| println!("{}: {text}", head.status()))
///     .on_fail(|error| eprintln!("login failed: {error}"))
///     .go()?
///     .wait()
///     .await
/// # }
/// ```
pub struct RequestBuilder<T> {
    client:  Client<T>,
    method:  Method,
    url:     String,
    headers: Option<Arc<dyn HeaderProvider>>,
    auth:    Option<Arc<dyn AuthProvider>>,
    body:    Option<Arc<dyn BodyProvider>>,
    success: Option<SuccessFn>,
    fail:    Option<FailFn>,
    make:    Option<MakeFn>,
    action:  Option<Arc<dyn ActionProvider>>,
    options: RequestOptions,
}

impl<T: Transport + 'static> RequestBuilder<T> {
    pub(crate) fn new(client: Client<T>, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: None,
            auth: None,
            body: None,
            success: None,
            fail: None,
            make: None,
            action: None,
            options: RequestOptions::default(),
        }
    }

    pub fn method(&self) -> Method { self.method }

    // headers

    /// Send `pairs` as headers, in order.
    #[must_use]
    pub fn headers<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.header_provider(MapHeaders::new(pairs))
    }

    /// Send the fields of a serializable struct or map as headers.
    ///
    /// # Errors
    ///
    /// [`Error::Serialize`] if `value` is not a struct or map.
    pub fn headers_from<S: Serialize + ?Sized>(self, value: &S) -> Result<Self> {
        Ok(self.header_provider(ObjectHeaders::from_serialize(value)?))
    }

    #[must_use]
    pub fn header_provider(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.headers = Some(Arc::new(provider));
        self
    }

    // auth

    #[must_use]
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth_provider(BasicAuth::new(username, password))
    }

    /// Send `value` verbatim as the `Authorization` header.
    #[must_use]
    pub fn auth(self, value: impl Into<String>) -> Self { self.auth_provider(RawAuth::new(value)) }

    #[must_use]
    pub fn auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(provider));
        self
    }

    // bodies

    /// Attach a request body.
    ///
    /// # Errors
    ///
    /// [`Error::BodyNotAllowed`] on GET and HEAD.
    pub fn body(self, provider: impl BodyProvider + 'static) -> Result<Self> { self.body_arc(Arc::new(provider)) }

    /// Attach a shared request body.
    ///
    /// # Errors
    ///
    /// [`Error::BodyNotAllowed`] on GET and HEAD.
    pub fn body_arc(mut self, provider: Arc<dyn BodyProvider>) -> Result<Self> {
        if !self.method.allows_body() {
            return Err(Error::BodyNotAllowed { method: self.method });
        }
        self.body = Some(provider);
        Ok(self)
    }

    pub fn text(self, text: impl Into<String>) -> Result<Self> { self.body(TextBody::new(text)) }

    pub fn text_as(self, content_type: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        self.body(TextBody::with_content_type(content_type, text))
    }

    /// Stream `reader` as an `application/octet-stream` body.
    pub fn stream(self, reader: impl AsyncRead + Send + Unpin + 'static) -> Result<Self> {
        self.body(StreamBody::new(reader))
    }

    pub fn stream_as(self, content_type: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Result<Self> {
        self.body(StreamBody::new(reader).content_type(content_type))
    }

    pub fn form<I, K, V>(self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.body(FormBody::new(pairs))
    }

    /// URL-encode the fields of a serializable struct or map as the body.
    ///
    /// # Errors
    ///
    /// [`Error::BodyNotAllowed`] on GET and HEAD, [`Error::Serialize`] if
    /// `value` is not a struct or map.
    pub fn form_from<S: Serialize + ?Sized>(self, value: &S) -> Result<Self> {
        if !self.method.allows_body() {
            return Err(Error::BodyNotAllowed { method: self.method });
        }
        let body = FormBody::from_serialize(value)?;
        self.body(body)
    }

    /// Send `files` and `params` as `multipart/form-data`.
    pub fn upload<F, I, K, V>(self, files: F, params: I) -> Result<Self>
    where
        F: IntoIterator<Item = NamedFileStream>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.upload_hooked(files, params, ProgressHooks::default())
    }

    /// Like [`upload`](Self::upload), reporting upload progress.
    pub fn upload_with<F, I, K, V>(
        self,
        files: F,
        params: I,
        on_progress: impl Fn(u64, Option<u64>) + Send + Sync + 'static,
        on_complete: impl Fn(u64) + Send + Sync + 'static,
    ) -> Result<Self>
    where
        F: IntoIterator<Item = NamedFileStream>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let hooks = ProgressHooks::new().on_progress(on_progress).on_completed(on_complete);
        self.upload_hooked(files, params, hooks)
    }

    fn upload_hooked<F, I, K, V>(self, files: F, params: I, hooks: ProgressHooks) -> Result<Self>
    where
        F: IntoIterator<Item = NamedFileStream>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if !self.method.allows_body() {
            return Err(Error::BodyNotAllowed { method: self.method });
        }
        self.body(MultipartBody::new().params(params).files(files).hooks(hooks))
    }

    // outcome callbacks

    /// Handle the raw response; the returned future's error is propagated.
    #[must_use]
    pub fn on_success<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResponseHead, ResponseBody) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.success = Some(Arc::new(move |head: ResponseHead, body: ResponseBody| -> BoxFuture<'static, Result<()>> {
            Box::pin(f(head, body))
        }));
        self
    }

    /// Read the whole body as text, then call `f`.
    #[must_use]
    pub fn on_success_text(mut self, f: impl Fn(ResponseHead, String) + Send + Sync + 'static) -> Self {
        let f = Arc::new(f);
        self.success = Some(Arc::new(move |head: ResponseHead, body: ResponseBody| -> BoxFuture<'static, Result<()>> {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let text = body.text().await?;
                f(head, text);
                Ok(())
            })
        }));
        self
    }

    #[must_use]
    pub fn on_text(self, f: impl Fn(String) + Send + Sync + 'static) -> Self { self.on_success_text(move |_, text| f(text)) }

    /// Stream the response body into `path`, creating or truncating it.
    #[must_use]
    pub fn download_to(self, path: impl Into<PathBuf>) -> Self { self.download(Download::to(path)) }

    #[must_use]
    pub fn download(mut self, download: Download) -> Self {
        self.success = Some(download.into_handler());
        self
    }

    /// Append the response body to `path`, creating it when missing.
    #[must_use]
    pub fn append_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.success = Some(append_handler(path.into(), Arc::new(LocalFs::new())));
        self
    }

    /// Handle a failed exchange. The error counts as handled.
    #[must_use]
    pub fn on_fail(mut self, f: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.fail = Some(Arc::new(move |error: Error| -> Result<()> {
            f(error);
            Ok(())
        }));
        self
    }

    /// Handle a failed exchange, deciding what `wait()` reports.
    #[must_use]
    pub fn on_fail_with(mut self, f: impl Fn(Error) -> Result<()> + Send + Sync + 'static) -> Self {
        self.fail = Some(Arc::new(f));
        self
    }

    /// Adjust the request right before its headers are resolved.
    #[must_use]
    pub fn on_make(mut self, f: impl Fn(&mut RawRequest) + Send + Sync + 'static) -> Self {
        self.make = Some(Arc::new(f));
        self
    }

    /// Replace all outcome callbacks with `action`.
    ///
    /// Takes precedence over `on_success`, `on_fail` and `on_make`.
    #[must_use]
    pub fn action(mut self, action: impl ActionProvider + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    // options

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.timeout(timeout);
        self
    }

    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.options = self.options.cancel_on(token);
        self
    }

    #[must_use]
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.options = self.options.error_for_status(enabled);
        self
    }

    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    // dispatch

    /// Validate the configuration and produce a [`Request`].
    ///
    /// # Errors
    ///
    /// [`Error::EmptyUrl`] or [`Error::InvalidUrl`].
    pub fn build(&self) -> Result<Request> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyUrl);
        }
        let url = Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

        let action = match self.action {
            Some(ref action) => Arc::clone(action),
            None => Arc::new(SettableAction::new(self.success.clone(), self.fail.clone(), self.make.clone())),
        };

        Ok(Request {
            method: self.method,
            url,
            headers: self.headers.clone(),
            auth: self.auth.clone(),
            body: self.body.clone(),
            action,
            options: self.options.clone(),
        })
    }

    /// Dispatch the request and return immediately.
    ///
    /// May be called repeatedly; each call runs an independent exchange with
    /// the same providers.
    ///
    /// # Errors
    ///
    /// URL validation errors from [`build`](Self::build), or
    /// [`Error::NoRuntime`] outside a Tokio runtime.
    pub fn go(&self) -> Result<RequestHandle> { self.client.execute(self.build()?) }
}

impl<T> fmt::Debug for RequestBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.is_some())
            .field("auth", &self.auth.is_some())
            .field("body", &self.body.as_ref().map(|b| b.content_type().to_string()))
            .field("action", &self.action.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
