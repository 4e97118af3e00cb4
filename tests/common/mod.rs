#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use catalog_api::{
    config::AppConfig,
    db,
    entities::Product,
    events::{self, EventSender},
    handlers::AppServices,
    repositories::DbProductRepository,
    services::{CreateProductRequest, ProductService},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Application harness backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with a freshly migrated database.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let db_path = dir.path().join("catalog_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1",
            18_080,
            "test",
        );
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), EventSender::new(event_tx));
        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        Self {
            router: catalog_api::app_router(state.clone()),
            state,
            _dir: dir,
            _event_task: event_task,
        }
    }

    pub fn products(&self) -> Arc<ProductService> {
        self.state.product_service()
    }

    /// Repository over the same database, bypassing the service rules.
    pub fn repository(&self) -> DbProductRepository {
        DbProductRepository::new(self.state.db.clone())
    }

    /// Creates a product through the service.
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        self.products()
            .create_product(CreateProductRequest {
                name: name.to_string(),
                price,
                stock,
                ..Default::default()
            })
            .await
            .expect("failed to seed product")
    }

    /// Sends a request through the router and decodes the JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not json")
        };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads a decimal serialized either as a JSON string or a number.
pub fn json_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
