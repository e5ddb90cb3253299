use std::fmt;
use std::sync::Arc;

#[cfg(feature = "reqwest")]
use once_cell::sync::Lazy;
use tokio::task::JoinHandle;

use crate::builder::RequestBuilder;
use crate::data::{Method, Request};
use crate::effects::cookies::{self, CookieStore};
use crate::effects::executor::execute;
use crate::effects::Transport;
#[cfg(feature = "reqwest")]
use crate::effects::ReqwestTransport;
use crate::error::{Error, Result};

/// The client used by the crate-level verb functions.
#[cfg(feature = "reqwest")]
pub type DefaultClient = Client<ReqwestTransport>;

#[cfg(feature = "reqwest")]
static SHARED: Lazy<DefaultClient> = Lazy::new(|| Client::new(ReqwestTransport::default()));

/// Entry point for building and dispatching requests over a [`Transport`].
///
/// Cloning is cheap; clones share the transport and cookie store.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, ReqwestTransport};
///
/// # async fn run() -> courier::Result<()> {
/// let client = Client::new(ReqwestTransport::default());
/// client
///     .get("https://example.com/")
///     .on_text(|text| println!("{text}"))
///     .go()?
///     .wait()
///     .await
/// # }
/// ```
pub struct Client<T> {
    transport: Arc<T>,
    cookies:   Option<Arc<dyn CookieStore>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cookies:   self.cookies.clone(),
        }
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &std::any::type_name::<T>())
            .field("own_cookie_store", &self.cookies.is_some())
            .finish()
    }
}

#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
    /// The lazily created process-wide client.
    pub fn shared() -> Self { SHARED.clone() }
}

impl<T: Transport + 'static> Client<T> {
    pub fn new(transport: T) -> Self { Self::from_arc(Arc::new(transport)) }

    pub fn from_arc(transport: Arc<T>) -> Self {
        Self {
            transport,
            cookies: None,
        }
    }

    /// Use `store` instead of the global cookie store.
    #[must_use]
    pub fn cookie_store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.cookies = Some(store);
        self
    }

    /// The store requests of this client read and write.
    pub fn cookies(&self) -> Arc<dyn CookieStore> { self.cookies.clone().unwrap_or_else(cookies::global) }

    pub fn transport(&self) -> &T { &self.transport }

    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<T> {
        RequestBuilder::new(self.clone(), method, url.into())
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Get, url) }

    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Head, url) }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Post, url) }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Put, url) }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Patch, url) }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Delete, url) }

    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<T> { self.request(Method::Options, url) }

    /// Spawn `request` on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a runtime.
    pub fn execute(&self, request: Request) -> Result<RequestHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let task = execute(request, Arc::clone(&self.transport), self.cookies());
        Ok(RequestHandle {
            task: runtime.spawn(task),
        })
    }
}

/// A dispatched request.
///
/// Dropping the handle detaches the request; it still runs to completion.
#[derive(Debug)]
pub struct RequestHandle {
    task: JoinHandle<Result<()>>,
}

impl RequestHandle {
    /// Wait for the terminal callback and return whatever it returned.
    ///
    /// # Errors
    ///
    /// The error returned by `on_success`/`on_fail`, or [`Error::Join`] when
    /// the task panicked or was aborted.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Join(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool { self.task.is_finished() }

    /// Abort the request task; `wait` then reports [`Error::Join`].
    pub fn abort(&self) { self.task.abort(); }
}
