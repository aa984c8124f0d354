// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use diag_core::services::ClusterTools;
use diag_core::{DiagnosticsError, Result};

/// What the test server sends back for a path.
#[derive(Clone)]
pub enum Reply {
    Body(u16, String),
    /// Headers promising a large body, a few bytes, then silence.
    Stall,
}

/// Minimal HTTP/1.1 responder bound to an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn serve(routes: &[(&str, Reply)]) -> TestServer {
    let routes: Arc<HashMap<String, Reply>> = Arc::new(
        routes
            .iter()
            .map(|(path, reply)| (path.to_string(), reply.clone()))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(handle(stream, routes));
        }
    });
    TestServer { addr, task }
}

async fn handle(mut stream: TcpStream, routes: Arc<HashMap<String, Reply>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

    match routes.get(&path).cloned() {
        Some(Reply::Body(status, body)) => write_response(&mut stream, status, &body).await,
        Some(Reply::Stall) => {
            let head = "HTTP/1.1 200 OK\r\nContent-Length: 1048576\r\n\r\npartial";
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.flush().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        None => write_response(&mut stream, 404, "not found").await,
    }
}

async fn write_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Cluster tooling double with fixed answers.
pub struct FakeTools {
    pub units: std::result::Result<Vec<String>, String>,
    pub role: std::result::Result<String, String>,
}

impl FakeTools {
    pub fn new(units: &[&str], role: &str) -> Self {
        Self {
            units: Ok(units.iter().map(|u| u.to_string()).collect()),
            role: Ok(role.to_string()),
        }
    }
}

#[async_trait]
impl ClusterTools for FakeTools {
    async fn unit_names(&self) -> Result<Vec<String>> {
        self.units.clone().map_err(DiagnosticsError::Tooling)
    }

    async fn node_role(&self) -> Result<String> {
        self.role.clone().map_err(DiagnosticsError::Tooling)
    }
}
