use std::fmt;
use std::future::{self, Future};
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::parse_cookie_pairs;
use crate::data::{BodyProvider, Header, RawRequest, Request, ResponseStream};
use crate::effects::cookies::CookieStore;
use crate::effects::copy::{COPY_BUFFER_SIZE, ProgressCopy};
use crate::effects::http::{Transport, TransportBody, TransportRequest, TransportResponse};
use crate::error::{Error, Result};

/// In-memory pipe between the body copy and the transport.
const PIPE_CAPACITY: usize = 4 * COPY_BUFFER_SIZE;

/// Lifecycle of a single exchange, as reported in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unsent,
    HeadersResolved,
    BodySending,
    AwaitingResponse,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Unsent => "unsent",
            Phase::HeadersResolved => "headers-resolved",
            Phase::BodySending => "body-sending",
            Phase::AwaitingResponse => "awaiting-response",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        })
    }
}

/// Run one request to completion.
///
/// Exactly one of the action's `on_success` or `on_fail` is invoked and
/// its result is returned as-is. The request's timeout and cancellation
/// token cover the response body too: reading it past the deadline or after
/// cancellation fails with an `io::Error` that converts to
/// [`Error::Timeout`] or [`Error::Cancelled`].
pub(crate) async fn execute<T: Transport>(
    request: Request,
    transport: Arc<T>,
    cookies: Arc<dyn CookieStore>,
) -> Result<()> {
    let span = tracing::debug_span!("request", method = %request.method, url = %request.url);

    async move {
        let deadline = request.options.timeout.map(|limit| Instant::now() + limit);
        let cancel = request.options.cancel.clone();
        let outcome = bounded(
            exchange(&request, transport.as_ref(), cookies.as_ref()),
            deadline,
            cancel.as_ref(),
        )
        .await;

        let result = match outcome {
            Ok(mut response) => {
                tracing::debug!(phase = %Phase::Succeeded, status = response.status);
                response.body = guard_body(response.body, deadline, cancel);
                let (head, body) = response.into_parts();
                request.action.on_success(head, body).await
            }
            Err(error) => {
                tracing::debug!(phase = %Phase::Failed, error = %error);
                request.action.on_fail(error)
            }
        };

        if let Err(ref error) = result {
            tracing::warn!(error = %error, "request finished with an unhandled error");
        }
        result
    }
    .instrument(span)
    .await
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => future::pending().await,
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Apply the request's deadline and cancellation to `inner`.
async fn bounded<F, R>(inner: F, deadline: Option<Instant>, cancel: Option<&CancellationToken>) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    tokio::select! {
        biased;
        _ = cancelled(cancel) => Err(Error::Cancelled),
        _ = expired(deadline) => Err(Error::Timeout),
        result = inner => result,
    }
}

fn interrupted(error: Error) -> io::Error {
    let kind = match error {
        Error::Timeout => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::ConnectionAborted,
    };
    io::Error::new(kind, error)
}

/// End the response body with an error once the deadline passes or the
/// token fires.
fn guard_body(body: ResponseStream, deadline: Option<Instant>, cancel: Option<CancellationToken>) -> ResponseStream {
    if deadline.is_none() && cancel.is_none() {
        return body;
    }

    Box::pin(stream::unfold(Some(body), move |state: Option<ResponseStream>| {
        let cancel = cancel.clone();
        async move {
            let Some(mut body) = state else {
                return None;
            };
            let chunk = tokio::select! {
                biased;
                _ = cancelled(cancel.as_ref()) => Some(Err(interrupted(Error::Cancelled))),
                _ = expired(deadline) => Some(Err(interrupted(Error::Timeout))),
                chunk = body.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => Some((Ok(bytes), Some(body))),
                Some(Err(e)) => Some((Err(e), None)),
                None => None,
            }
        }
    }))
}

async fn exchange<T: Transport>(
    request: &Request,
    transport: &T,
    cookies: &dyn CookieStore,
) -> Result<TransportResponse> {
    tracing::trace!(phase = %Phase::Unsent);

    let mut raw = RawRequest::new(request.method, request.url.clone(), request.options.timeout);
    request.action.on_make(&mut raw);

    let host = raw.url().host_str().unwrap_or_default().to_ascii_lowercase();

    if let Some(ref provider) = request.headers {
        for header in provider.headers() {
            if header.is("cookie") {
                for (name, value) in parse_cookie_pairs(header.value()) {
                    cookies.insert(&host, &name, &value);
                }
            } else {
                raw.push(header);
            }
        }
    }
    if let Some(ref auth) = request.auth {
        raw.push(auth.header());
    }
    if let Some(cookie) = cookies.cookie_header(&host) {
        raw.push(Header::new("Cookie", cookie));
    }
    tracing::trace!(phase = %Phase::HeadersResolved, headers = raw.headers().len());

    let body = request.body.as_ref().filter(|_| request.method.allows_body());
    let response = match body {
        Some(provider) => send_with_body(raw, provider.as_ref(), transport).await?,
        None => {
            tracing::trace!(phase = %Phase::AwaitingResponse);
            transport.send(TransportRequest::from_raw(raw, None)).await?
        }
    };

    let response_host = response.url.host_str().unwrap_or(&host).to_ascii_lowercase();
    for set_cookie in response.headers.get_all("set-cookie") {
        cookies.store_response(&response_host, set_cookie);
    }

    if request.options.error_for_status && !(200..300).contains(&response.status) {
        return Err(Error::Status {
            status: response.status,
            url:    response.url.to_string(),
        });
    }

    Ok(response)
}

/// Stream the provider's body into the transport while it sends.
///
/// A failed copy is reported to the transport as the body stream's last
/// item, so a truncated upload never looks complete on the wire.
async fn send_with_body<T: Transport>(
    mut raw: RawRequest,
    provider: &dyn BodyProvider,
    transport: &T,
) -> Result<TransportResponse> {
    raw.remove_header("content-type");
    raw.push(Header::new("Content-Type", provider.content_type()));

    let (reader, len) = provider.open().await?.into_parts();
    tracing::trace!(phase = %Phase::BodySending, len = ?len);

    let (pipe_writer, pipe_reader) = tokio::io::duplex(PIPE_CAPACITY);
    let (failed_tx, failed_rx) = oneshot::channel::<io::Error>();

    // Resolves once the copy is over: empty on success, the error otherwise.
    let copy_failure = stream::once(failed_rx).filter_map(|received| future::ready(received.ok().map(Err::<Bytes, _>)));
    let body = TransportBody::new(
        Box::pin(ReaderStream::with_capacity(pipe_reader, COPY_BUFFER_SIZE).chain(copy_failure)),
        len,
    );

    let copy = async move {
        let copied = ProgressCopy::new(reader, pipe_writer)
            .total(len)
            .on_progress(move |sent, total| provider.on_progress(sent, total))
            .on_completed(move |total| provider.on_completed(total))
            .run()
            .await;
        // `forwarded` is false once the transport has dropped the body.
        copied.map_err(|e| {
            let forwarded = failed_tx.send(io::Error::new(e.kind(), e.to_string())).is_ok();
            (e, forwarded)
        })
    };

    let (sent, copied) = tokio::join!(transport.send(TransportRequest::from_raw(raw, Some(body))), copy);

    match (sent, copied) {
        (Ok(response), Ok(total)) => {
            tracing::trace!(phase = %Phase::AwaitingResponse, sent = total);
            Ok(response)
        }
        (Err(error), Ok(_)) | (Err(error), Err((_, false))) => Err(error),
        // The server answered and the transport let go of the body.
        (Ok(response), Err((e, false))) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::trace!(phase = %Phase::AwaitingResponse, "body abandoned after early response");
            Ok(response)
        }
        (_, Err((e, _))) => Err(Error::Body(e)),
    }
}
