pub mod common;
pub mod health;
pub mod products;

use crate::events::EventSender;
use crate::repositories::{DbProductRepository, DynProductRepository};
use crate::services::ProductService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
}

impl AppServices {
    /// Wires the sea-orm repository into the product service.
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let repository: DynProductRepository = Arc::new(DbProductRepository::new(db));
        Self::with_repository(repository, event_sender)
    }

    pub fn with_repository(repository: DynProductRepository, event_sender: EventSender) -> Self {
        Self {
            products: Arc::new(ProductService::new(repository, event_sender)),
        }
    }
}
