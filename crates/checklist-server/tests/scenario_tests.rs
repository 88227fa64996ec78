//! End-to-end tests against a real loopback listener

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use checklist_core::{ServerConfig, Store};
use checklist_server::{serve, serve_with_listener, AppState, ServerError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: std::net::SocketAddr,
    data_path: PathBuf,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), ServerError>>,
    _dir: tempfile::TempDir,
}

async fn start() -> Running {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join(".tab-checklist-data.json");
    let store = Store::new(&data_path);
    store.initialize().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve_with_listener(
        listener,
        Arc::new(AppState::new(store)),
        1024 * 1024,
        async move {
            let _ = rx.await;
        },
    ));

    Running {
        addr,
        data_path,
        shutdown: tx,
        handle,
        _dir: dir,
    }
}

struct RawResponse {
    status: u16,
    head: String,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }
}

async fn request(addr: std::net::SocketAddr, method: &str, path: &str, body: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();

    RawResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn test_checklist_scenario() {
    let server = start().await;
    assert_eq!(std::fs::read_to_string(&server.data_path).unwrap(), "{}");

    let response = request(server.addr, "GET", "/data", "").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.body, "{}");

    let doc = r#"{"work":[{"text":"Ship release","completed":false,"url":"https://example.com"}]}"#;
    let response = request(server.addr, "POST", "/data", doc).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"success": true}"#);

    let response = request(server.addr, "GET", "/data", "").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, doc);

    let response = request(server.addr, "POST", "/data", "{broken").await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body, r#"{"error": "Invalid JSON"}"#);

    let response = request(server.addr, "GET", "/data", "").await;
    assert_eq!(response.body, doc);

    // The widget reads the file directly and must see the same bytes
    assert_eq!(std::fs::read_to_string(&server.data_path).unwrap(), doc);

    server.shutdown.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cors_headers_on_every_response() {
    let server = start().await;

    let cases = [
        ("GET", "/data", "", 200),
        ("POST", "/data", "not json", 400),
        ("OPTIONS", "/data", "", 200),
        ("OPTIONS", "/nowhere", "", 200),
        ("GET", "/nowhere", "", 404),
    ];

    for (method, path, body, status) in cases {
        let response = request(server.addr, method, path, body).await;
        assert_eq!(response.status, status, "{method} {path}");
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            response.header("access-control-allow-methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            response.header("access-control-allow-headers"),
            Some("Content-Type")
        );
    }

    let response = request(server.addr, "GET", "/nowhere", "").await;
    assert_eq!(response.body, "Not found");

    server.shutdown.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_fallback_after_delete() {
    let server = start().await;
    request(server.addr, "POST", "/data", r#"{"reading":[]}"#).await;
    std::fs::remove_file(&server.data_path).unwrap();

    let response = request(server.addr, "GET", "/data", "").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "{}");

    server.shutdown.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_port_in_use_is_fatal() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join(".tab-checklist-data.json");
    let config = ServerConfig {
        port,
        data_file: Some(data_path.clone()),
        ..Default::default()
    };

    let result = tokio::time::timeout(Duration::from_secs(5), serve(&config))
        .await
        .expect("serve should return instead of running");

    match result {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        other => panic!("expected bind error, got {other:?}"),
    }

    // The document is created before the port is bound
    assert_eq!(std::fs::read_to_string(&data_path).unwrap(), "{}");
    drop(taken);
}
