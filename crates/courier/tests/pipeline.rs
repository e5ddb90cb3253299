//! Request pipeline tests against an in-process transport.
//!
//! The mock transport records every resolved request and answers with a
//! canned response, so ordering and callback guarantees can be checked
//! without a network.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;

use courier::{
    CancellationToken, Client, CookieJar, CookieStore, Error, Header, Headers, Method, NamedFileStream, Result,
    StreamBody, Transport, TransportRequest, TransportResponse,
};

#[derive(Debug, Clone)]
struct Captured {
    method:  Method,
    url:     String,
    headers: Headers,
    body:    Option<Vec<u8>>,
    len:     Option<u64>,
}

/// Mock transport for testing.
#[derive(Default)]
struct MockTransport {
    captured:         Mutex<Vec<Captured>>,
    status:           u16,
    response_headers: Vec<(&'static str, &'static str)>,
    response_body:    &'static str,
    delay:            Option<Duration>,
}

impl MockTransport {
    fn ok(body: &'static str) -> Self {
        Self {
            status: 200,
            response_body: body,
            ..Default::default()
        }
    }

    fn captured(&self) -> Vec<Captured> { self.captured.lock().unwrap().clone() }
}

impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let (body, len) = match request.body {
            Some(body) => {
                let len = body.len;
                (Some(body.collect().await?), len)
            }
            None => (None, None),
        };
        self.captured.lock().unwrap().push(Captured {
            method: request.method,
            url: request.url.to_string(),
            headers: request.headers,
            body,
            len,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let headers: Headers = self.response_headers.iter().map(|(n, v)| Header::new(*n, *v)).collect();
        Ok(TransportResponse::from_bytes(self.status, request.url, headers, self.response_body))
    }
}

fn client(transport: MockTransport) -> (Client<MockTransport>, Arc<MockTransport>, Arc<CookieJar>) {
    let transport = Arc::new(transport);
    let jar = Arc::new(CookieJar::new());
    let client = Client::from_arc(Arc::clone(&transport)).cookie_store(jar.clone());
    (client, transport, jar)
}

#[derive(Default)]
struct Counters {
    success: AtomicUsize,
    fail:    AtomicUsize,
}

#[tokio::test]
async fn test_success_runs_exactly_once() {
    let (client, _, _) = client(MockTransport::ok("hello"));
    let counters = Arc::new(Counters::default());
    let text = Arc::new(Mutex::new(String::new()));

    let (c1, c2, t) = (counters.clone(), counters.clone(), text.clone());
    client
        .get("http://example.com/")
        .on_text(move |body| {
            c1.success.fetch_add(1, Ordering::SeqCst);
            *t.lock().unwrap() = body;
        })
        .on_fail(move |_| {
            c2.fail.fetch_add(1, Ordering::SeqCst);
        })
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(counters.success.load(Ordering::SeqCst), 1);
    assert_eq!(counters.fail.load(Ordering::SeqCst), 0);
    assert_eq!(*text.lock().unwrap(), "hello");
}

#[tokio::test]
async fn test_status_failure_runs_fail_exactly_once() {
    let (client, _, _) = client(MockTransport {
        status: 503,
        ..Default::default()
    });
    let counters = Arc::new(Counters::default());
    let status = Arc::new(Mutex::new(None));

    let (c1, c2, s) = (counters.clone(), counters.clone(), status.clone());
    client
        .get("http://example.com/busy")
        .on_text(move |_| {
            c1.success.fetch_add(1, Ordering::SeqCst);
        })
        .on_fail(move |error| {
            c2.fail.fetch_add(1, Ordering::SeqCst);
            if let Error::Status { status, .. } = error {
                *s.lock().unwrap() = Some(status);
            }
        })
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(counters.success.load(Ordering::SeqCst), 0);
    assert_eq!(counters.fail.load(Ordering::SeqCst), 1);
    assert_eq!(*status.lock().unwrap(), Some(503));
}

#[tokio::test]
async fn test_go_twice_runs_two_exchanges() {
    let (client, transport, _) = client(MockTransport::ok(""));
    let successes = Arc::new(AtomicUsize::new(0));

    let s = successes.clone();
    let builder = client
        .post("http://example.com/items")
        .text("payload")
        .unwrap()
        .on_text(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

    let first = builder.go().unwrap();
    let second = builder.go().unwrap();
    first.wait().await.unwrap();
    second.wait().await.unwrap();

    assert_eq!(successes.load(Ordering::SeqCst), 2);
    let captured = transport.captured();
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|c| c.body.as_deref() == Some(&b"payload"[..])));
}

#[tokio::test]
async fn test_cookie_round_trip() {
    let (client, transport, jar) = client(MockTransport {
        status: 200,
        response_headers: vec![("Set-Cookie", "session=abc; Domain=example.com; Path=/")],
        ..Default::default()
    });

    client.get("http://example.com/login").go().unwrap().wait().await.unwrap();
    client.get("http://api.example.com/me").go().unwrap().wait().await.unwrap();
    client.get("http://example.org/").go().unwrap().wait().await.unwrap();

    let captured = transport.captured();
    assert_eq!(captured[0].headers.get("cookie"), None);
    assert_eq!(captured[1].headers.get("cookie"), Some("session=abc"));
    assert_eq!(captured[2].headers.get("cookie"), None);
    assert_eq!(jar.cookie_header("www.example.com").as_deref(), Some("session=abc"));
}

#[tokio::test]
async fn test_cookie_header_is_stored_for_request_host() {
    let (client, transport, jar) = client(MockTransport::ok(""));

    client
        .get("http://example.com/")
        .headers([("Cookie", "theme=dark"), ("Accept", "text/plain")])
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    let captured = transport.captured();
    assert_eq!(captured[0].headers.get("accept"), Some("text/plain"));
    assert_eq!(captured[0].headers.get_all("cookie").count(), 1);
    assert_eq!(jar.cookie_header("example.com").as_deref(), Some("theme=dark"));
    assert_eq!(jar.cookie_header("sub.example.com"), None);
}

#[tokio::test]
async fn test_form_body_and_auth_headers() {
    let (client, transport, _) = client(MockTransport::ok(""));

    client
        .put("http://example.com/form")
        .basic_auth("Aladdin", "open sesame")
        .form([("a", "b c"), ("d", "e")])
        .unwrap()
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    let captured = &transport.captured()[0];
    assert_eq!(captured.method, Method::Put);
    assert_eq!(captured.headers.get("authorization"), Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="));
    assert_eq!(captured.headers.get("content-type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(captured.body.as_deref(), Some(&b"a=b%20c&d=e"[..]));
    assert_eq!(captured.len, Some(11));
}

#[tokio::test]
async fn test_upload_reports_monotonic_progress_and_exact_total() {
    let (client, transport, _) = client(MockTransport::ok(""));
    let events = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(Mutex::new(Vec::new()));

    let payload = vec![7u8; 20_000];
    let file = NamedFileStream::new("file", "blob.bin", "application/octet-stream", Cursor::new(payload.clone()))
        .with_len(payload.len() as u64);

    let (e, c) = (events.clone(), completed.clone());
    client
        .post("http://example.com/upload")
        .upload_with(
            [file],
            [("kind", "blob")],
            move |sent, total| e.lock().unwrap().push((sent, total)),
            move |total| c.lock().unwrap().push(total),
        )
        .unwrap()
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    let captured = &transport.captured()[0];
    let body = captured.body.clone().unwrap();
    let content_type = captured.headers.get("content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(captured.len, Some(body.len() as u64));

    let events = events.lock().unwrap();
    assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(events.iter().all(|(sent, _)| *sent <= body.len() as u64));
    assert_eq!(*completed.lock().unwrap(), vec![body.len() as u64]);
}

#[tokio::test]
async fn test_stream_body_is_single_use() {
    let (client, _, _) = client(MockTransport::ok(""));
    let body = Arc::new(StreamBody::new(Cursor::new(b"once".to_vec())));
    let builder = client.post("http://example.com/").body_arc(body).unwrap();

    builder.go().unwrap().wait().await.unwrap();
    let err = builder.go().unwrap().wait().await.unwrap_err();
    assert!(matches!(err, Error::BodyConsumed));
}

#[tokio::test]
async fn test_on_make_sees_unresolved_request() {
    let (client, transport, _) = client(MockTransport::ok(""));
    let seen = Arc::new(Mutex::new(None));

    let s = seen.clone();
    client
        .get("http://example.com/a")
        .headers([("X-Provider", "1")])
        .on_make(move |raw| {
            *s.lock().unwrap() = Some(raw.headers().len());
            raw.header("X-Made", "yes");
            raw.url_mut().set_query(Some("q=1"));
        })
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(0));
    let captured = &transport.captured()[0];
    assert_eq!(captured.url, "http://example.com/a?q=1");
    let names: Vec<&str> = captured.headers.iter().map(Header::name).collect();
    assert_eq!(names, vec!["X-Made", "X-Provider"]);
}

#[tokio::test]
async fn test_success_callback_error_is_not_rerouted() {
    let (client, _, _) = client(MockTransport::ok("x"));
    let failures = Arc::new(AtomicUsize::new(0));

    let f = failures.clone();
    let err = client
        .get("http://example.com/")
        .on_success(|_head, _body| async { Err(Error::callback("handler rejected response")) })
        .on_fail(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Callback(ref msg) if msg == "handler rejected response"));
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fail_callback_can_reraise() {
    let (client, _, _) = client(MockTransport {
        status: 404,
        ..Default::default()
    });

    let err = client
        .get("http://example.com/missing")
        .on_fail_with(Err)
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_timeout_and_cancel_are_distinct() {
    let (client, _, _) = client(MockTransport {
        status: 200,
        delay: Some(Duration::from_secs(10)),
        ..Default::default()
    });

    let err = client
        .get("http://example.com/slow")
        .timeout(Duration::from_millis(20))
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));

    let token = CancellationToken::new();
    let handle = client
        .get("http://example.com/slow")
        .cancel_on(token.clone())
        .go()
        .unwrap();
    token.cancel();
    assert!(matches!(handle.wait().await.unwrap_err(), Error::Cancelled));
}

/// Streams a ten-byte body, one byte per tick.
struct DripTransport {
    tick: Duration,
}

impl Transport for DripTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let tick = self.tick;
        let chunks = futures_util::stream::iter(0..10u8).then(move |i| async move {
            tokio::time::sleep(tick).await;
            Ok::<_, std::io::Error>(Bytes::from(vec![b'0' + i]))
        });
        let headers: Headers = vec![Header::new("Content-Length", "10")].into();
        Ok(TransportResponse::new(200, request.url, headers, Box::pin(chunks)))
    }
}

fn drip_client() -> Client<DripTransport> {
    Client::new(DripTransport {
        tick: Duration::from_millis(50),
    })
    .cookie_store(Arc::new(CookieJar::new()))
}

#[tokio::test]
async fn test_cancel_stops_a_running_download() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.bin");
    let token = CancellationToken::new();
    let completed = Arc::new(AtomicUsize::new(0));

    let c = completed.clone();
    let handle = drip_client()
        .get("http://example.com/slow.bin")
        .cancel_on(token.clone())
        .download(courier::Download::to(&path).on_completed(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .go()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    token.cancel();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(completed.load(Ordering::SeqCst), 0);
    assert!(tokio::fs::metadata(&path).await.unwrap().len() < 10);
}

#[tokio::test]
async fn test_timeout_covers_the_response_body() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slow.bin");
    let failures = Arc::new(AtomicUsize::new(0));

    let f = failures.clone();
    let err = drip_client()
        .get("http://example.com/slow.bin")
        .timeout(Duration::from_millis(100))
        .download_to(&path)
        .on_fail(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    // The head arrived in time, so the failure comes back from the download handler.
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_body_within_deadline_is_complete() {
    let text = Arc::new(Mutex::new(String::new()));

    let t = text.clone();
    drip_client()
        .get("http://example.com/slow.txt")
        .timeout(Duration::from_secs(5))
        .on_text(move |body| *t.lock().unwrap() = body)
        .go()
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(*text.lock().unwrap(), "0123456789");
}

#[tokio::test]
async fn test_global_cookie_store_is_used_by_default() {
    let jar = Arc::new(CookieJar::new());
    let previous = courier::cookies::set_global(jar.clone());

    let transport = MockTransport {
        status: 200,
        response_headers: vec![("Set-Cookie", "g=1")],
        ..Default::default()
    };
    Client::new(transport).get("http://global.test/").go().unwrap().wait().await.unwrap();

    assert_eq!(jar.cookie_header("global.test").as_deref(), Some("g=1"));
    courier::cookies::set_global(previous);
}
