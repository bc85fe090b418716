//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};

use postbox::clock::ManualClock;
use postbox::db::MemoryKvStore;
use postbox::moderation::Moderator;
use postbox::web::handlers::AppState;
use postbox::web::middleware::RateLimitState;
use postbox::web::router::create_router;
use postbox::web::session::SESSION_COOKIE;
use postbox::{build_state, Config};

/// Moderator with a switchable verdict that counts its calls.
#[derive(Default)]
pub struct StubModerator {
    reject: AtomicBool,
    calls: AtomicUsize,
}

impl StubModerator {
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Moderator for StubModerator {
    async fn is_safe(&self, _text: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        !self.reject.load(Ordering::SeqCst)
    }
}

/// A router over in-memory storage with handles to its collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub kv: Arc<MemoryKvStore>,
    pub clock: Arc<ManualClock>,
    pub moderator: Arc<StubModerator>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_kv(Arc::new(MemoryKvStore::new())).await
    }

    pub async fn with_kv(kv: Arc<MemoryKvStore>) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let moderator = Arc::new(StubModerator::default());
        let state = build_state(
            &Config::default(),
            kv.clone(),
            moderator.clone(),
            clock.clone(),
        )
        .await
        .expect("Failed to build state");

        let router = create_router(state.clone(), Arc::new(RateLimitState::new(10_000)), &[]);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            kv,
            clock,
            moderator,
        }
    }

    /// Register `username` in a new session and return the session id and user JSON.
    pub async fn register(&self, username: &str) -> (String, Value) {
        let response = self
            .server
            .post("/api/register")
            .json(&json!({ "username": username }))
            .await;
        response.assert_status_ok();

        let session = response.cookie(SESSION_COOKIE).value().to_string();
        let body = response.json::<Value>();
        (session, body["data"].clone())
    }

    /// POST a letter as `session`.
    pub async fn send(&self, session: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .post("/api/letters")
            .add_cookie(session_cookie(session))
            .json(&body)
            .await
    }

    /// GET `path` as `session` and return the `data` field.
    pub async fn get_as(&self, session: &str, path: &str) -> Value {
        let response = self
            .server
            .get(path)
            .add_cookie(session_cookie(session))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"].clone()
    }
}

/// Cookie carrying `session`.
pub fn session_cookie(session: &str) -> axum_extra::extract::cookie::Cookie<'static> {
    axum_extra::extract::cookie::Cookie::new(SESSION_COOKIE, session.to_string())
}
