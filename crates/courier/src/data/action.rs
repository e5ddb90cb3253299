use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::data::{RawRequest, ResponseBody, ResponseHead};
use crate::error::{Error, Result};

/// Raw success callback: receives the head and owns the body stream.
pub type SuccessFn = Arc<dyn Fn(ResponseHead, ResponseBody) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Failure callback. Returning `Err` propagates the error past the executor.
pub type FailFn = Arc<dyn Fn(Error) -> Result<()> + Send + Sync>;

/// Pre-send customization hook.
pub type MakeFn = Arc<dyn Fn(&mut RawRequest) + Send + Sync>;

/// The outcome callbacks of a request.
///
/// For every execution exactly one of [`on_success`](Self::on_success) and
/// [`on_fail`](Self::on_fail) is invoked, exactly once. Whatever they return
/// is handed to the awaiting [`RequestHandle`](crate::RequestHandle)
/// untouched.
pub trait ActionProvider: Send + Sync {
    /// Last-moment changes to the request before headers are resolved.
    fn on_make(&self, _request: &mut RawRequest) {}

    fn on_success(&self, head: ResponseHead, body: ResponseBody) -> BoxFuture<'_, Result<()>>;

    fn on_fail(&self, error: Error) -> Result<()>;
}

/// Ignores success and re-raises failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAction;

impl ActionProvider for NoAction {
    fn on_success(&self, _head: ResponseHead, _body: ResponseBody) -> BoxFuture<'_, Result<()>> { Box::pin(async { Ok(()) }) }

    fn on_fail(&self, error: Error) -> Result<()> { Err(error) }
}

/// Callback slots filled individually; unset slots behave like [`NoAction`].
#[derive(Clone, Default)]
pub struct SettableAction {
    success: Option<SuccessFn>,
    fail:    Option<FailFn>,
    make:    Option<MakeFn>,
}

impl SettableAction {
    pub fn new(success: Option<SuccessFn>, fail: Option<FailFn>, make: Option<MakeFn>) -> Self { Self { success, fail, make } }

    #[must_use]
    pub fn on_success(mut self, f: SuccessFn) -> Self {
        self.success = Some(f);
        self
    }

    #[must_use]
    pub fn on_fail(mut self, f: FailFn) -> Self {
        self.fail = Some(f);
        self
    }

    #[must_use]
    pub fn on_make(mut self, f: MakeFn) -> Self {
        self.make = Some(f);
        self
    }
}

impl fmt::Debug for SettableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableAction")
            .field("success", &self.success.is_some())
            .field("fail", &self.fail.is_some())
            .field("make", &self.make.is_some())
            .finish()
    }
}

impl ActionProvider for SettableAction {
    fn on_make(&self, request: &mut RawRequest) {
        if let Some(ref make) = self.make {
            make(request);
        }
    }

    fn on_success(&self, head: ResponseHead, body: ResponseBody) -> BoxFuture<'_, Result<()>> {
        match self.success {
            Some(ref success) => success(head, body),
            None => NoAction.on_success(head, body),
        }
    }

    fn on_fail(&self, error: Error) -> Result<()> {
        match self.fail {
            Some(ref fail) => fail(error),
            None => NoAction.on_fail(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use url::Url;

    use super::*;
    use crate::data::{Headers, Method};

    fn head() -> ResponseHead { ResponseHead::new(200, Url::parse("http://example.com/").unwrap(), Headers::new()) }

    #[tokio::test]
    async fn test_no_action_ignores_success_and_reraises() {
        assert!(NoAction.on_success(head(), ResponseBody::from_bytes("x")).await.is_ok());
        let err = NoAction.on_fail(Error::Timeout).unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn test_settable_action_uses_supplied_callbacks() {
        let captured = Arc::new(Mutex::new(None::<String>));
        let sink = Arc::clone(&captured);
        let success: SuccessFn = Arc::new(move |_head: ResponseHead, body: ResponseBody| -> BoxFuture<'static, Result<()>> {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                let text = body.text().await?;
                *sink.lock().unwrap() = Some(text);
                Ok(())
            })
        });

        let action = SettableAction::default()
            .on_success(success)
            .on_fail(Arc::new(|_: Error| -> Result<()> { Ok(()) }))
            .on_make(Arc::new(|raw: &mut RawRequest| raw.header("X-Made", "1")));

        ActionProvider::on_success(&action, head(), ResponseBody::from_bytes("body")).await.unwrap();
        assert_eq!(captured.lock().unwrap().as_deref(), Some("body"));

        assert!(ActionProvider::on_fail(&action, Error::Cancelled).is_ok());

        let mut raw = RawRequest::new(Method::Get, Url::parse("http://example.com/").unwrap(), None);
        ActionProvider::on_make(&action, &mut raw);
        assert_eq!(raw.headers().get("x-made"), Some("1"));
    }

    #[test]
    fn test_settable_action_defaults_fail_to_reraise() {
        let action = SettableAction::default();
        assert!(ActionProvider::on_fail(&action, Error::Network("down".into())).is_err());
    }
}
