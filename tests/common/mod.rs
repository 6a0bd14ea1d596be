//! In-process mock of the API server.
//!
//! # Design
//! An axum router on a random port, run on its own tokio runtime in a
//! background thread so the blocking client under test can call it from the
//! test thread. Every request to a recording route is captured for
//! inspection.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use cx_cli::config::{Config, Credentials};

pub const SERVER_DATE: &str = "2013-04-22T15:06:20.252Z";
pub const USERNAME: &str = "user@example.com";
pub const SECRET: &str = "api&user&c2VjcmV0";

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub auth: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

pub struct MockServer {
    pub addr: SocketAddr,
    pub log: Log,
}

impl MockServer {
    /// Server whose `/public/date` answers with `SERVER_DATE`.
    pub fn start() -> Self {
        Self::spawn(true)
    }

    /// Server whose `/public/date` fails with a 500 and a non-JSON body.
    pub fn start_without_date() -> Self {
        Self::spawn(false)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Config pointing relative paths at this server.
    pub fn config(&self) -> Config {
        Config {
            credentials: Credentials::new(USERNAME, SECRET).unwrap(),
            apiserver: format!("http://{}", self.addr),
            timeout: Some(std::time::Duration::from_secs(10)),
        }
    }

    /// Requests other than the date lookup, in arrival order.
    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    fn spawn(with_date: bool) -> Self {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = router(with_date).with_state(log.clone());

        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                axum::serve(listener, app).await
            })
            .unwrap();
        });

        MockServer { addr, log }
    }
}

fn router(with_date: bool) -> Router<Log> {
    let date = if with_date {
        get(|| async {
            (
                [(CONTENT_TYPE, "application/json")],
                format!(r#"{{"date":"{SERVER_DATE}"}}"#),
            )
        })
    } else {
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "date service down") })
    };
    Router::new()
        .route("/public/date", date)
        .route("/site", any(site))
        .route("/missing", any(missing))
        .route("/raw", any(raw))
        .route("/bad-json", any(bad_json))
}

fn record(log: &Log, method: Method, path: &str, headers: &HeaderMap, body: Bytes) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    log.lock().unwrap().push(Recorded {
        method,
        path: path.to_string(),
        auth: header("x-cxense-authentication"),
        content_type: header("content-type"),
        body: body.to_vec(),
    });
}

async fn site(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&log, method, "/site", &headers, body);
    (
        [(CONTENT_TYPE, "application/json; charset=utf-8")],
        r#"{"sites":[{"id":"123","name":"Tromsø","url":"http://www.example.com"}]}"#,
    )
}

async fn missing(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&log, method, "/missing", &headers, body);
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "application/json")],
        r#"{"error":"not found"}"#,
    )
}

async fn raw(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&log, method, "/raw", &headers, body);
    ([(CONTENT_TYPE, "text/plain")], vec![0xFFu8, 0x00, 0x41])
}

async fn bad_json(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&log, method, "/bad-json", &headers, body);
    ([(CONTENT_TYPE, "application/json")], "{not json")
}
