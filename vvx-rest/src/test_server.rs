//! Local HTTP endpoint standing in for a phone web server.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    Router,
};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

struct ServerState {
    /// Answers in order, the last one repeats forever.
    script: Vec<(u16, String)>,
    seen: Mutex<Vec<SeenRequest>>,
}

pub struct TestServer {
    port: u16,
    state: Arc<ServerState>,
}

impl TestServer {
    pub fn start(script: Vec<(u16, &str)>) -> Self {
        assert!(!script.is_empty(), "Should script at least one answer");
        let state = Arc::new(ServerState {
            script: script
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect(),
            seen: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind test listener");
        listener
            .set_nonblocking(true)
            .expect("Should switch listener to non blocking");
        let port = listener
            .local_addr()
            .expect("Should know the listener address")
            .port();

        let app = Router::new().fallback(answer).with_state(state.clone());
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Should build test runtime");
            runtime.block_on(async move {
                axum::Server::from_tcp(listener)
                    .expect("Should serve on test listener")
                    .serve(app.into_make_service())
                    .await
                    .expect("Test server failed");
            });
        });

        TestServer { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.seen.lock().unwrap().len()
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

async fn answer(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let hit = {
        let mut seen = state.seen.lock().unwrap();
        seen.push(SeenRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            content_type: header_value(&headers, header::CONTENT_TYPE),
            authorization: header_value(&headers, header::AUTHORIZATION),
            body,
        });
        seen.len() - 1
    };

    let (status, body) = state
        .script
        .get(hit)
        .or_else(|| state.script.last())
        .cloned()
        .unwrap();
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}
