use futures_util::future::BoxFuture;
use serde::Serialize;

use super::{BodyProvider, BodySource, ProgressHooks};
use crate::core::{encode_form, flatten};
use crate::error::Result;

/// An `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone)]
pub struct FormBody {
    encoded: String,
    hooks:   ProgressHooks,
}

impl FormBody {
    pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

    /// Encode pairs in iteration order.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            encoded: encode_form(pairs),
            hooks:   ProgressHooks::default(),
        }
    }

    /// Encode the fields of a serializable struct or map.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Serialize`](crate::Error::Serialize) if `value` is
    /// not a struct or map.
    pub fn from_serialize<S: Serialize + ?Sized>(value: &S) -> Result<Self> { Ok(Self::new(flatten(value)?)) }

    #[must_use]
    pub fn hooks(mut self, hooks: ProgressHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn as_str(&self) -> &str { &self.encoded }
}

impl BodyProvider for FormBody {
    fn content_type(&self) -> &str { Self::CONTENT_TYPE }

    fn open(&self) -> BoxFuture<'_, Result<BodySource>> {
        let bytes = self.encoded.clone().into_bytes();
        Box::pin(async move { Ok(BodySource::from_bytes(bytes)) })
    }

    fn on_progress(&self, sent: u64, total: Option<u64>) { self.hooks.progress(sent, total); }

    fn on_completed(&self, total: u64) { self.hooks.completed(total); }
}
