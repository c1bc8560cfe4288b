//! Common test utilities for cdp-ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use cdp_ledger_service::{create_router, AppState, ServiceConfig};
use cdp_ledger_store::MemoryStore;

/// Email granted the ledger operator role in every harness.
pub const OPERATOR_EMAIL: &str = "operator@example.com";

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery staple";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
}

impl TestHarness {
    /// Create a new test harness over an empty in-memory store.
    pub fn new() -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            jwt_secret: "integration-test-secret".into(),
            ledger_operators: vec![OPERATOR_EMAIL.into()],
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server }
    }

    /// Register `email` and return the created user body.
    pub async fn register(&self, email: &str) -> Value {
        let response = self
            .server
            .post("/users")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    /// Log `email` in and return the bearer header value.
    pub async fn login(&self, email: &str) -> HeaderValue {
        let response = self
            .server
            .post("/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let token = body["access_token"].as_str().expect("token in response");
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header")
    }

    /// Register and log in `email`.
    pub async fn user(&self, email: &str) -> HeaderValue {
        self.register(email).await;
        self.login(email).await
    }

    /// A member without ledger capabilities.
    pub async fn member(&self) -> HeaderValue {
        self.user("member@example.com").await
    }

    /// The configured ledger operator.
    pub async fn operator(&self) -> HeaderValue {
        self.user(OPERATOR_EMAIL).await
    }

    /// Record a deposit as `auth` and return the created body.
    pub async fn deposit(&self, auth: &HeaderValue, amount: i64, code: &str) -> Value {
        let response = self
            .server
            .post("/posts/cdp/")
            .add_header(authorization(), auth.clone())
            .json(&deposit_body(amount, code))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// The `Authorization` header name.
pub fn authorization() -> HeaderName {
    axum::http::header::AUTHORIZATION
}

/// A valid deposit creation body.
pub fn deposit_body(amount: i64, code: &str) -> Value {
    json!({
        "depositor": "Nguyen Van A",
        "depositor_pre": "Nguyen",
        "depositor_suf": "A",
        "amount": amount,
        "margin": 0.5,
        "code": code,
    })
}

/// A valid payback creation body.
pub fn payback_body(amount: i64, code: &str) -> Value {
    json!({
        "depositor": "Nguyen Van A",
        "amount": amount,
        "code": code,
    })
}
