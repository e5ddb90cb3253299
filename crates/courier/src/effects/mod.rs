//! I/O: the transport, request execution, body copying, cookies and files.

pub mod cookies;
pub mod copy;
pub mod download;
pub(crate) mod executor;
pub mod http;

pub use cookies::{CookieJar, CookieStore};
pub use copy::{COPY_BUFFER_SIZE, PROGRESS_INTERVAL, ProgressCopy, stream_len};
pub use download::Download;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
pub use http::{BoxStream, RequestStream, Transport, TransportBody, TransportRequest, TransportResponse};
