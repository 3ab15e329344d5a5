#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use bizhub_api::app::{app, AppState};
use bizhub_api::config::AppConfig;
use bizhub_api::database::MemoryStore;

pub const PASSWORD: &str = "correct-horse-battery";

/// In-process server over a fresh in-memory store. Each test gets its own,
/// so tests never see each other's organizations.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development()).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(config));
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, Some(token), None).await
    }

    /// Registers `email`, founding `organization` when given. Returns the
    /// created organization's id, if any.
    pub async fn register(&self, email: &str, organization: Option<&str>) -> Result<Option<String>> {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "first_name": "Test",
                    "last_name": "User",
                    "organization_name": organization,
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register {} failed: {} {}", email, status, body);
        Ok(body["data"]["organization"]["id"].as_str().map(str::to_string))
    }

    /// Logs in and returns the bearer token plus the login payload.
    pub async fn login(&self, email: &str) -> Result<(String, Value)> {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login {} failed: {} {}", email, status, body);
        let token = body["data"]["token"].as_str().context("missing token")?.to_string();
        Ok((token, body["data"].clone()))
    }

    /// Invites `email` into the caller's active organization with `role`
    /// and accepts it as that user (who must already be registered).
    pub async fn join(&self, admin_token: &str, email: &str, role: &str) -> Result<()> {
        let (status, body) = self
            .post("/api/organization/invitations", admin_token, json!({ "email": email, "role": role }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "invite failed: {} {}", status, body);
        let token = body["data"]["token"].as_str().context("missing invitation token")?.to_string();

        let (user_token, _) = self.login(email).await?;
        let (status, body) = self
            .post("/api/invitations/accept", &user_token, json!({ "token": token }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "accept failed: {} {}", status, body);
        Ok(())
    }
}
