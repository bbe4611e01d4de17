//! In-process static file server for tests that need real HTTP.
//!
//! Serves JSON documents under `/data/<key>` and records the path of every
//! request it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use atlas_common::Dataset;

#[derive(Default)]
struct Files {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

/// Static server bound to an ephemeral local port. Aborted on drop.
pub struct TestServer {
    addr: SocketAddr,
    files: Arc<Files>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(documents: Vec<(Dataset, Value)>) -> std::io::Result<Self> {
        let bodies = documents
            .into_iter()
            .map(|(dataset, body)| {
                let bytes = serde_json::to_vec(&body).unwrap_or_default();
                (format!("/data/{}", dataset.key()), bytes)
            })
            .collect();
        let files = Arc::new(Files { bodies, requests: Mutex::default() });

        let app = Router::new().fallback(serve).with_state(files.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, files, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for an `HttpSource`, with trailing slash.
    pub fn data_url(&self) -> String {
        format!("http://{}/data/", self.addr)
    }

    /// Paths of all GET requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.files
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of GET requests for `path`, e.g. `/data/global_summary.json`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| *p == path).count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(State(files): State<Arc<Files>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    files
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(uri.path().to_string());

    match files.bodies.get(uri.path()) {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
