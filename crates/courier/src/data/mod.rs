//! Immutable request/response types and the provider capabilities.
//!
//! Header, auth, body and action providers are traits with the built-in
//! variants living next to them. Everything here is plain data or a pure
//! function of its configuration; I/O lives in [`crate::effects`].

pub mod action;
pub mod auth;
pub mod body;
pub mod header;
pub mod options;
pub mod request;
pub mod response;

pub use action::{ActionProvider, FailFn, MakeFn, NoAction, SettableAction, SuccessFn};
pub use auth::{AuthProvider, BasicAuth, RawAuth};
pub use body::{
    BodyProvider, BodyReader, BodySource, CompletedFn, FormBody, MultipartBody, NamedFileStream, ProgressFn,
    ProgressHooks, StreamBody, TextBody,
};
pub use header::{Header, HeaderProvider, Headers, MapHeaders, MultiHeaders, ObjectHeaders};
pub use options::ClientOptions;
pub use request::{Method, RawRequest, Request, RequestOptions};
pub use response::{ResponseBody, ResponseHead, ResponseStream};
