//! Product catalog and stock management service.
//!
//! Three layers: axum handlers parse requests, [`services::ProductService`]
//! applies the business rules, and [`repositories::ProductRepository`]
//! issues SQL through sea-orm.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod repositories;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn product_service(&self) -> Arc<services::ProductService> {
        self.services.products.clone()
    }
}

/// Catalog, admin and health routes bound to `state`
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::products::products_routes())
        .merge(handlers::products::admin_routes())
        .merge(handlers::health::health_routes())
        .with_state(state)
}
