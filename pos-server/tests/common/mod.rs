//! Shared harness for the HTTP integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pos_server::auth::{JwtConfig, hash_password};
use pos_server::core::{Config, ServerState};
use pos_server::db::DbService;
use pos_server::db::repository::{branch, user};
use pos_server::utils::time::FixedClock;
use serde_json::Value;
use shared::models::{BranchCreate, Role, User};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdefghijklmnop";
pub const PASSWORD: &str = "chai1234";
/// 2025-06-14 15:30 IST
pub const NOW: &str = "2025-06-14T10:00:00Z";

pub struct TestApp {
    pub state: ServerState,
    pub clock: Arc<FixedClock>,
    pub admin: User,
    pub biller_br01: User,
    pub biller_br02: User,
    _dir: TempDir,
}

impl TestApp {
    /// Printers point at a closed loopback port unless overridden
    pub async fn spawn() -> Self {
        Self::spawn_with_printer_port(closed_port().await).await
    }

    pub async fn spawn_with_printer_port(printer_port: u16) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.jwt = JwtConfig::with_secret(TEST_SECRET);
        config.printer_port = printer_port;
        config.printer_timeout_ms = 500;
        config.timezone = chrono_tz::Asia::Kolkata;

        let db = DbService::new(&config.database_url).await.unwrap();
        let clock = Arc::new(FixedClock::at(NOW));
        let state = ServerState::build(config, db.pool, clock.clone());

        for (code, name) in [("BR01", "Indiranagar"), ("BR02", "Koramangala")] {
            branch::create(
                &state.pool,
                BranchCreate {
                    name: name.into(),
                    branch_code: code.into(),
                    address: String::new(),
                    printer_ip: Some("127.0.0.1".into()),
                },
                0,
            )
            .await
            .unwrap();
        }

        let admin = seed_user(&state, "Meera", "admin@chai.test", Role::Admin, None).await;
        let biller_br01 =
            seed_user(&state, "Ravi", "ravi@chai.test", Role::Biller, Some("BR01")).await;
        let biller_br02 =
            seed_user(&state, "Asha", "asha@chai.test", Role::Biller, Some("BR02")).await;

        Self {
            state,
            clock,
            admin,
            biller_br01,
            biller_br02,
            _dir: dir,
        }
    }

    pub fn app(&self) -> Router {
        pos_server::api::build_app(self.state.clone())
    }

    pub fn token(&self, user: &User) -> String {
        self.state.get_jwt_service().generate_token(user).unwrap()
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        let token = self.token(user);
        self.request(Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(user);
        self.request(Method::POST, uri, Some(&token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(user);
        self.request(Method::PUT, uri, Some(&token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        let token = self.token(user);
        self.request(Method::DELETE, uri, Some(&token), None).await
    }
}

pub async fn seed_user(
    state: &ServerState,
    name: &str,
    email: &str,
    role: Role,
    branch_code: Option<&str>,
) -> User {
    user::create(
        &state.pool,
        user::NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
            branch_code: branch_code.map(str::to_string),
        },
        0,
    )
    .await
    .unwrap()
}

/// A loopback port with nothing listening
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A printer port that never completes a handshake
///
/// The listener never accepts and its backlog is filled up front, so new
/// connects hang until the client gives up.
pub struct StalledPrinter {
    pub port: u16,
    _listener: tokio::net::TcpListener,
    _queued: Vec<tokio::net::TcpStream>,
}

pub async fn stalled_printer() -> StalledPrinter {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut queued = Vec::new();
    for _ in 0..16 {
        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            tokio::net::TcpStream::connect(addr),
        )
        .await;
        match attempt {
            Ok(Ok(stream)) => queued.push(stream),
            _ => break,
        }
    }

    StalledPrinter {
        port: addr.port(),
        _listener: listener,
        _queued: queued,
    }
}

/// The Chai/Samosa order used across scenarios
pub fn chai_samosa(branch_code: &str) -> Value {
    serde_json::json!({
        "branchCode": branch_code,
        "items": [
            { "itemName": "Chai", "quantity": 2, "price": 20 },
            { "itemName": "Samosa", "quantity": 1, "price": 15 }
        ],
        "totalAmount": 55,
        "paymentMode": "upi"
    })
}
