#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use reelgate::auth::PinSource;
use reelgate::clock::Clock;
use reelgate::config::{Config, PasswordConfig};
use reelgate::email::PinDelivery;
use reelgate::state::{AppState, Collaborators, SharedState};
use reelgate::store::{MemoryStore, ResetStore};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// Clock that only moves when a test tells it to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Captures delivered PINs instead of sending mail.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingDelivery {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Delivery runs on a detached task, so give it a moment to land.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, String)> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl PinDelivery for RecordingDelivery {
    async fn deliver(&self, to_email: &str, pin: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), pin.to_string()));
        Ok(())
    }
}

/// Hands out 123456, 123457, ... so every issued PIN is distinct and predictable.
pub struct SequencePinSource {
    next: AtomicU32,
}

impl SequencePinSource {
    pub const FIRST: u32 = 123_456;
}

impl Default for SequencePinSource {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(Self::FIRST),
        }
    }
}

impl PinSource for SequencePinSource {
    fn next_pin(&self) -> u32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        token_ttl_minutes: 60,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        // Cheap work factor keeps the suite fast
        password: PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        reset_reap_interval_secs: 0,
        max_body_size: 65_536,
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        smtp: None,
    }
}

/// Shared state wired to in-memory collaborators the test can inspect.
pub struct TestState {
    pub state: SharedState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub delivery: Arc<RecordingDelivery>,
}

pub fn test_state() -> TestState {
    test_state_with(test_config()).expect("test state")
}

pub fn test_state_with(config: Config) -> Result<TestState, String> {
    let store = Arc::new(MemoryStore::new());
    build_state(config, store.clone(), store)
}

/// Like `test_state_with`, but reset requests go through `resets` instead of the
/// user store.
pub fn build_state(
    config: Config,
    store: Arc<MemoryStore>,
    resets: Arc<dyn ResetStore>,
) -> Result<TestState, String> {
    let clock = Arc::new(ManualClock::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let state = AppState::new(
        config,
        Collaborators {
            users: store.clone(),
            resets,
            delivery: delivery.clone(),
            pin_source: Arc::new(SequencePinSource::default()),
            clock: clock.clone(),
        },
    )?;

    Ok(TestState {
        state,
        store,
        clock,
        delivery,
    })
}

/// A running test server backed by the in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub delivery: Arc<RecordingDelivery>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/auth/register",
            &json!({ "name": "Test User", "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post_json("/auth/login", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> (Value, StatusCode) {
        self.post_json("/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn reset_password(&self, email: &str, pin: &str, password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/auth/reset-password",
            &json!({ "email": email, "pin": pin, "password": password }),
        )
        .await
    }

    /// GET with a raw `Authorization` header value, or none.
    pub async fn get_with_auth(&self, path: &str, authorization: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.get(self.url(path));
        if let Some(value) = authorization {
            req = req.header("authorization", value);
        }
        let resp = req.send().await.expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Latest PIN stored for an email.
    pub fn latest_pin(&self, email: &str) -> Option<String> {
        self.store.resets_for(email).last().map(|r| r.pin.clone())
    }
}

pub async fn spawn_app() -> TestApp {
    let TestState {
        state,
        store,
        clock,
        delivery,
    } = test_state();

    let app = reelgate::build_app(state);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        store,
        clock,
        delivery,
    }
}
