#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use jocrol_api::{config::AppConfig, db, AppState};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up the application over a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::establish_connection_with_config(&db::DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = jocrol_api::app_router(state.clone());

        Self { router, state }
    }

    /// Send a request against the router, with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a fully built request.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request expecting `status`; returns the decoded JSON body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        status: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body).await;
        let actual = response.status();
        let body = body_json(response).await;
        assert_eq!(actual, status, "{} {} answered {}", method, uri, body);
        body
    }

    /// Creates a resource through its form endpoint and returns the stored record.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let created = self
            .json(Method::POST, uri, Some(body), StatusCode::CREATED)
            .await;
        created["data"].clone()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// Decimals serialize as strings
pub fn decimal(value: &Value) -> Decimal {
    let raw = value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    Decimal::from_str(&raw).expect("decimal value")
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("record has an id").to_string()
}
