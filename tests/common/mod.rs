//! Minimal HTTP stub server for integration tests.
//!
//! Serves a fixed route table and records every request it sees, so tests
//! can assert on probe counts and ordering without real network access.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A route: exact path, response status, content type, body.
#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Route {
    pub fn new(path: &str, status: u16, content_type: &str, body: &str) -> Self {
        Self {
            path: path.to_string(),
            status,
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }
}

pub struct StubServer {
    /// Base URL, e.g. `http://127.0.0.1:49152`
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Requests seen so far, as `"METHOD /path"` strings in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a stub server on an ephemeral port.
pub async fn start(routes: Vec<Route>) -> StubServer {
    start_with(|_| routes).await
}

/// Start a stub server whose route table may reference the server's own
/// base URL (for payloads embedding absolute links back to the stub).
pub async fn start_with(routes_for: impl FnOnce(&str) -> Vec<Route>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let routes = routes_for(&url);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            let log = log.clone();

            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }

                let text = String::from_utf8_lossy(&buf[..read]).to_string();
                let mut parts = text.lines().next().unwrap_or("").split_whitespace();
                let method = parts.next().unwrap_or("").to_string();
                let target = parts.next().unwrap_or("").to_string();
                let path = target.split('?').next().unwrap_or("").to_string();
                log.lock().unwrap().push(format!("{} {}", method, path));

                let (status, content_type, body) = routes
                    .iter()
                    .find(|r| r.path == path)
                    .map(|r| (r.status, r.content_type.clone(), r.body.clone()))
                    .unwrap_or((404, "text/plain".to_string(), String::new()));

                let reason = if status == 200 { "OK" } else { "Error" };
                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    reason,
                    content_type,
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                if method != "HEAD" {
                    let _ = socket.write_all(body.as_bytes()).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    StubServer { url, requests }
}
