//! Builder-configured asynchronous HTTP requests.
//!
//! A request is assembled from pluggable providers (headers, authorization,
//! body, outcome callbacks), dispatched with [`RequestBuilder::go`] and run
//! as a Tokio task. Bodies are streamed in both directions with time-gated
//! progress, cookies are kept in a shared [`CookieStore`], and exactly one
//! of the success or failure callbacks runs per dispatch.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Request/response types and the provider traits
//! - [`core`] - Pure transformations (encoding, cookie parsing, multipart framing)
//! - [`effects`] - I/O: transport, executor, copy engine, cookie store, downloads
//!
//! # Examples
//!
//! ```no_run
//! # async fn run() -> courier::Result<()> {
//! courier::get("https://example.com/archive.tar.gz")
//!     .download(
//!         courier::Download::to("archive.tar.gz")
//!             .on_progress(|written, total| println!("{written}/{total:?}")),
//!     )
//!     .go()?
//!     .wait()
//!     .await
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;

mod builder;
mod client;
mod error;

pub use builder::RequestBuilder;
#[cfg(feature = "reqwest")]
pub use client::DefaultClient;
pub use client::{Client, RequestHandle};
pub use data::{
    ActionProvider, AuthProvider, BasicAuth, BodyProvider, BodySource, ClientOptions, FormBody, Header,
    HeaderProvider, Headers, MapHeaders, Method, MultiHeaders, MultipartBody, NamedFileStream, NoAction,
    ObjectHeaders, ProgressHooks, RawAuth, RawRequest, Request, RequestOptions, ResponseBody, ResponseHead,
    SettableAction, StreamBody, TextBody,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestTransport;
pub use effects::cookies::{self, CookieJar, CookieStore};
pub use effects::{Download, Transport, TransportBody, TransportRequest, TransportResponse};
pub use error::{Error, Result};

pub use courier_fs::{FileSink, LocalFs, SinkOptions};
pub use tokio_util::sync::CancellationToken;

/// Start a GET request on the shared client.
///
/// The shared client uses [`ReqwestTransport::default`] and the global
/// cookie store. Build a [`Client`] to customize either.
#[cfg(feature = "reqwest")]
pub fn get(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Get, url) }

/// Start a HEAD request on the shared client.
#[cfg(feature = "reqwest")]
pub fn head(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Head, url) }

/// Start a POST request on the shared client.
#[cfg(feature = "reqwest")]
pub fn post(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Post, url) }

/// Start a PUT request on the shared client.
#[cfg(feature = "reqwest")]
pub fn put(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Put, url) }

/// Start a PATCH request on the shared client.
#[cfg(feature = "reqwest")]
pub fn patch(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Patch, url) }

/// Start a DELETE request on the shared client.
#[cfg(feature = "reqwest")]
pub fn delete(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Delete, url) }

/// Start an OPTIONS request on the shared client.
#[cfg(feature = "reqwest")]
pub fn options(url: impl Into<String>) -> RequestBuilder<ReqwestTransport> { DefaultClient::shared().request(Method::Options, url) }
