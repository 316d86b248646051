#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    _uploads: tempfile::TempDir,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let uploads = tempfile::tempdir().context("failed to create upload dir")?;

        // In-memory store and cheap password hashing keep the suite fast and
        // independent of a database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_carelink-api"));
        cmd.arg("--memory")
            .arg("--port")
            .arg(port.to_string())
            .env("APP_ENV", "development")
            .env("HOST", "127.0.0.1")
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_PASSWORD_MEMORY_KIB", "1024")
            .env("SECURITY_PASSWORD_TIME_COST", "1")
            .env("SECURITY_UNIFORM_AUTH_ERRORS", "false")
            .env("STORAGE_UPLOAD_DIR", uploads.path())
            .env("STORAGE_MAX_UPLOAD_BYTES", "4096")
            .env_remove("DATABASE_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            _uploads: uploads,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Username unique to this test run; every test shares one server
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub struct Session {
    pub username: String,
    pub email: String,
    pub token: String,
}

pub async fn signup(server: &TestServer, prefix: &str, role: &str) -> Result<Session> {
    let username = unique(prefix);
    let email = format!("{}@example.com", username);
    let resp = Client::new()
        .post(server.url("/signup"))
        .json(&json!({
            "username": username,
            "email": email,
            "telephone": "5550100",
            "password": "correct-horse",
            "role": role
        }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::CREATED, "signup failed: {}", resp.status());

    let body: Value = resp.json().await?;
    let token = body["token"].as_str().context("signup returned no token")?.to_string();
    Ok(Session { username, email, token })
}

pub fn request_body(family: &str, caretaker: &str) -> Value {
    json!({
        "name": "Bob",
        "age": 80,
        "gender": "male",
        "number": "5550199",
        "address": "1 Main St",
        "conditions": "diabetes",
        "history": "/uploads/history.pdf",
        "caretaker": caretaker,
        "family": family
    })
}

pub async fn get(server: &TestServer, session: &Session, path: &str) -> Result<Response> {
    Ok(Client::new()
        .get(server.url(path))
        .header("auth-token", &session.token)
        .send()
        .await?)
}

pub async fn post(server: &TestServer, session: &Session, path: &str, body: Value) -> Result<Response> {
    Ok(Client::new()
        .post(server.url(path))
        .header("auth-token", &session.token)
        .json(&body)
        .send()
        .await?)
}

pub async fn put(server: &TestServer, session: &Session, path: &str, body: Value) -> Result<Response> {
    Ok(Client::new()
        .put(server.url(path))
        .header("auth-token", &session.token)
        .json(&body)
        .send()
        .await?)
}

/// Submit a request as `family` naming `caretaker` and return its id
pub async fn create_request(server: &TestServer, family: &Session, caretaker: &str) -> Result<String> {
    let resp = post(server, family, "/requests", request_body(&family.username, caretaker)).await?;
    anyhow::ensure!(resp.status() == StatusCode::OK, "create request failed: {}", resp.status());

    let resp = get(server, family, "/requests").await?;
    let body: Value = resp.json().await?;
    let requests = body["userRequest"].as_array().context("no userRequest array")?;
    let id = requests
        .iter()
        .rev()
        .find(|r| r["caretaker_username"] == caretaker)
        .and_then(|r| r["id"].as_str())
        .context("created request not listed")?;
    Ok(id.to_string())
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}
