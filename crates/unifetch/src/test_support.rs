//! Local HTTP fixtures for tests: a real axum server on a background
//! thread, reachable from the blocking clients.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use flate2::{Compression, GzBuilder};
use tokio::sync::oneshot;

use crate::ReaderConfig;

pub(crate) const GZIP_PAYLOAD: &[u8] = b"decompressed payload line\nsecond line\n";
pub(crate) const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub(crate) const INDEX_LOOKALIKE_BODY: &str = "{\"real\": \"payload\"}";
pub(crate) const RAW_BODY: &str = "hello";

pub(crate) struct TestServer {
    pub base_url: String,
    pub state: Arc<FixtureState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Request counters and the current content version of `/files/report.txt`
#[derive(Default)]
pub(crate) struct FixtureState {
    pub version: AtomicUsize,
    pub full_responses: AtomicUsize,
    pub not_modified: AtomicUsize,
}

impl FixtureState {
    pub fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn full_responses(&self) -> usize {
        self.full_responses.load(Ordering::SeqCst)
    }

    pub fn not_modified(&self) -> usize {
        self.not_modified.load(Ordering::SeqCst)
    }
}

pub(crate) fn report_body(version: usize) -> String {
    format!("report version {version}\n").repeat(64)
}

async fn versioned_report(
    State(state): State<Arc<FixtureState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let version = state.version.load(Ordering::SeqCst);
    let etag = format!("\"v{version}\"");

    if method == Method::HEAD {
        return ([(header::ETAG, etag)], report_body(version)).into_response();
    }

    let matches = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if matches {
        state.not_modified.fetch_add(1, Ordering::SeqCst);
        return StatusCode::NOT_MODIFIED.into_response();
    }

    state.full_responses.fetch_add(1, Ordering::SeqCst);
    (
        [
            (header::ETAG, etag),
            (header::LAST_MODIFIED, LAST_MODIFIED.to_string()),
        ],
        report_body(version),
    )
        .into_response()
}

async fn last_modified_only(State(state): State<Arc<FixtureState>>, headers: HeaderMap) -> Response {
    let unchanged = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == LAST_MODIFIED);
    if unchanged {
        state.not_modified.fetch_add(1, Ordering::SeqCst);
        return StatusCode::NOT_MODIFIED.into_response();
    }

    state.full_responses.fetch_add(1, Ordering::SeqCst);
    ([(header::LAST_MODIFIED, LAST_MODIFIED)], "dated content").into_response()
}

async fn index_lookalike(headers: HeaderMap) -> Response {
    let etag = "\"e1\"";
    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if unchanged {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ETAG, etag),
        ],
        INDEX_LOOKALIKE_BODY,
    )
        .into_response()
}

async fn head_ok_get_forbidden(method: Method) -> StatusCode {
    if method == Method::HEAD {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    }
}

pub(crate) fn gzip_bytes(inner_name: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut builder = GzBuilder::new();
    if let Some(name) = inner_name {
        builder = builder.filename(name);
    }
    let mut encoder = builder.write(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

async fn gzip_archive() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/gzip"),
            (header::ETAG, "\"gz1\""),
        ],
        gzip_bytes(Some("inner.txt"), GZIP_PAYLOAD),
    )
        .into_response()
}

async fn gzip_unnamed() -> Response {
    (
        [(header::CONTENT_TYPE, "application/x-gzip")],
        gzip_bytes(None, GZIP_PAYLOAD),
    )
        .into_response()
}

async fn broken_gzip() -> Response {
    (
        [(header::CONTENT_TYPE, "application/x-gzip")],
        "this is definitely not a gzip stream",
    )
        .into_response()
}

async fn disposition() -> Response {
    (
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"quarterly report.csv\"",
        )],
        "a,b,c\n1,2,3\n",
    )
        .into_response()
}

async fn plain() -> &'static str {
    "no validators here"
}

/// Router serving every fixture used by the HTTP tests
pub(crate) fn fixture_router(state: Arc<FixtureState>) -> Router {
    Router::new()
        .route("/files/report.txt", get(versioned_report))
        .route("/dated/notes.txt", get(last_modified_only))
        .route("/forbidden/data.bin", get(head_ok_get_forbidden))
        .route("/archive", get(gzip_archive))
        .route("/unnamed.gz", get(gzip_unnamed))
        .route("/broken.gz", get(broken_gzip))
        .route("/download", get(disposition))
        .route("/api/index.json", get(index_lookalike))
        .route("/plain/hello.txt", get(plain))
        .route("/", get(plain))
        .with_state(state)
}

pub(crate) fn spawn_server(router: Router) -> (String, oneshot::Sender<()>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
    });

    (format!("http://{addr}"), tx)
}

/// Start the fixture server with fresh counters
pub(crate) fn start_fixture_server() -> TestServer {
    let state = Arc::new(FixtureState::default());
    let (base_url, shutdown) = spawn_server(fixture_router(Arc::clone(&state)));
    TestServer {
        base_url,
        state,
        shutdown: Some(shutdown),
    }
}

/// Which requests the raw server hangs up on without answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropOn {
    Head,
    Get,
}

/// Bare HTTP/1.1 server answering every request for [`RAW_BODY`], except
/// that requests of the `drop_on` method get their connection closed before
/// any response. Returns the base URL and the number of GET requests seen.
pub(crate) fn spawn_raw_server(drop_on: DropOn) -> (String, Arc<AtomicUsize>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let gets = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&gets);

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else {
                continue;
            };
            let head = read_request_head(&mut stream);
            let is_head = head.starts_with("HEAD ");
            if !is_head {
                counter.fetch_add(1, Ordering::SeqCst);
            }

            let dropped = match drop_on {
                DropOn::Head => is_head,
                DropOn::Get => !is_head,
            };
            if dropped {
                continue;
            }

            let mut response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                RAW_BODY.len()
            );
            if !is_head {
                response.push_str(RAW_BODY);
            }
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{addr}"), gets)
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// A URL nothing listens on
pub(crate) fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/missing.txt")
}

/// Reader configuration isolated from the environment's proxy settings
pub(crate) fn test_config(cache_dir: Option<&Path>) -> ReaderConfig {
    let builder = ReaderConfig::builder().with_system_proxy(false);
    match cache_dir {
        Some(dir) => builder.with_cache_dir(dir).build(),
        None => builder.with_caching_enabled(false).build(),
    }
}
