//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::header::{LINK, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::get;
use axum::{middleware, Extension, Router};
use server_push::config::PushConfig;
use server_push::http::{redirect_push_middleware, server_push_middleware};
use server_push::push::{PushError, PushHandle, Pusher, RedirectPush, ServerPush};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a test log subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server_push=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Link header served by `/`.
pub const PAGE_LINKS: &str =
    "</a.js>; rel=preload, </b.css>; rel=preload; nopush, <//evil.com/x>; rel=preload";

#[derive(Clone, Copy)]
enum Reply {
    Unsupported,
    Fail,
}

/// Push capability that records every push.
#[derive(Default)]
pub struct RecordingPusher {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, HeaderMap)>>,
}

#[allow(dead_code)]
impl RecordingPusher {
    pub fn unsupported(mut self, path: &str) -> Self {
        self.replies.insert(path.to_string(), Reply::Unsupported);
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.replies.insert(path.to_string(), Reply::Fail);
        self
    }

    pub fn calls(&self) -> Vec<(String, HeaderMap)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|(path, _)| path).collect()
    }
}

impl Pusher for RecordingPusher {
    fn push(&self, path: &str, headers: &HeaderMap) -> Result<(), PushError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), headers.clone()));
        match self.replies.get(path) {
            None => Ok(()),
            Some(Reply::Unsupported) => Err(PushError::Unsupported),
            Some(Reply::Fail) => Err(PushError::failed("stream reset")),
        }
    }
}

async fn page() -> impl IntoResponse {
    ([(LINK, PAGE_LINKS)], "<html></html>")
}

async fn scripts() -> impl IntoResponse {
    (
        AppendHeaders([
            (LINK, "</1.js>; rel=preload"),
            (LINK, "</2.js>; rel=preload"),
            (LINK, "</3.js>; rel=preload"),
        ]),
        "scripts",
    )
}

async fn login_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, "/login")])
}

async fn external_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, "https://other.example/x")])
}

async fn login() -> impl IntoResponse {
    ([(LOCATION, "/elsewhere")], "login")
}

/// Test application with both push middlewares built from `config`.
pub fn app(config: &PushConfig, pusher: Arc<RecordingPusher>) -> Router {
    init_tracing();
    let push = Arc::new(ServerPush::from_config(config).unwrap());
    let redirects = Arc::new(RedirectPush::from_config(config).unwrap());

    Router::new()
        .route("/", get(page))
        .route("/scripts", get(scripts))
        .route("/old", get(login_redirect))
        .route("/away", get(external_redirect))
        .route("/login", get(login))
        .layer(middleware::from_fn_with_state(push, server_push_middleware))
        .layer(middleware::from_fn_with_state(redirects, redirect_push_middleware))
        .layer(Extension(PushHandle::from_arc(pusher)))
}

/// Serve `router` on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_app(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
