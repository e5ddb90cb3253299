use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{BodyProvider, BodySource, ProgressHooks};
use crate::error::Result;

/// A UTF-8 text body.
#[derive(Debug, Clone)]
pub struct TextBody {
    text:         Arc<str>,
    content_type: String,
    hooks:        ProgressHooks,
}

impl TextBody {
    pub const DEFAULT_CONTENT_TYPE: &'static str = "application/text";

    pub fn new(text: impl Into<String>) -> Self { Self::with_content_type(Self::DEFAULT_CONTENT_TYPE, text) }

    pub fn with_content_type(content_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text:         Arc::from(text.into()),
            content_type: content_type.into(),
            hooks:        ProgressHooks::default(),
        }
    }

    #[must_use]
    pub fn hooks(mut self, hooks: ProgressHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl BodyProvider for TextBody {
    fn content_type(&self) -> &str { &self.content_type }

    fn open(&self) -> BoxFuture<'_, Result<BodySource>> {
        let bytes = self.text.as_bytes().to_vec();
        Box::pin(async move { Ok(BodySource::from_bytes(bytes)) })
    }

    fn on_progress(&self, sent: u64, total: Option<u64>) { self.hooks.progress(sent, total); }

    fn on_completed(&self, total: u64) { self.hooks.completed(total); }
}
