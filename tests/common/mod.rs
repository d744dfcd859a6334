#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use heartline_api::auth::JwtKeys;
use heartline_api::config::AppConfig;
use heartline_api::database::{JsonFileStore, Store};
use heartline_api::state::AppState;

/// In-process application over a memory-only datastore
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    keys: JwtKeys,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(JsonFileStore::in_memory()))
    }

    /// Application over a caller-supplied datastore
    pub fn with_store(store: Store) -> Self {
        let mut config = AppConfig::development();
        config.datastore.data_file = None;
        // Fast hashing keeps the suites quick
        config.security.bcrypt_cost = 4;

        let state = AppState::new(config, store);
        Self {
            keys: state.keys.clone(),
            router: heartline_api::app(state),
        }
    }

    /// Token for an arbitrary identity, without touching the datastore
    pub fn token_for(&self, user_id: &str, name: &str) -> Result<String> {
        Ok(self.keys.issue(user_id, name)?)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return (token, user id)
    pub async fn register(&self, name: &str) -> Result<(String, String)> {
        let res = self
            .post(
                "/auth/register",
                None,
                serde_json::json!({ "name": name, "password": "secret123" }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "register failed: {}", res.body);

        let token = res.body["data"]["token"]
            .as_str()
            .context("missing token")?
            .to_string();
        let user_id = res.body["data"]["user"]["id"]
            .as_str()
            .context("missing user id")?
            .to_string();
        Ok((token, user_id))
    }
}

/// The real binary on a free port, memory-only datastore
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_heartline-api"))
            .args(["--host", "127.0.0.1", "--port", &port.to_string(), "--in-memory"])
            .env("APP_ENV", "development")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("DATASTORE_BACKEND", "json")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
