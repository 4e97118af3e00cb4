use crate::{
    entities::product::Model as Product,
    errors::{RepositoryError, ServiceError},
    events::{Event, EventSender},
    repositories::{DynProductRepository, ListFilter, ProductPatch, ProductSort},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;
const MIN_NAME_LENGTH: usize = 3;
// Prices are stored as numeric(12,2).
const PRICE_SCALE: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 10;

/// Payload for creating a product
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(max = 255, message = "name cannot exceed 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    #[validate(
        url(message = "image_url must be a valid URL"),
        length(max = 1024, message = "image_url cannot exceed 1024 characters")
    )]
    pub image_url: Option<String>,
}

/// Partial update; only present fields are applied
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(max = 255, message = "name cannot exceed 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    #[validate(
        url(message = "image_url must be a valid URL"),
        length(max = 1024, message = "image_url cannot exceed 1024 characters")
    )]
    pub image_url: Option<String>,
}

/// Listing criteria accepted by [`ProductService::list_products`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub in_stock: Option<bool>,
    pub order_by: ProductSort,
    pub limit: Option<u64>,
    pub offset: u64,
}

/// One page of products. `total` counts the products on this page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
    pub limit: u64,
    pub offset: u64,
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ServiceError::InvalidName);
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    let limit = Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS));
    if price <= Decimal::ZERO || price >= limit || price.normalize().scale() > PRICE_SCALE {
        return Err(ServiceError::InvalidPrice);
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ServiceError> {
    if stock < 0 {
        return Err(ServiceError::InvalidStock);
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidQuantity);
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn not_found_as_product(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::ProductNotFound,
        other => ServiceError::Repository(other),
    }
}

/// Product catalog and stock management
#[derive(Clone)]
pub struct ProductService {
    repository: DynProductRepository,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(repository: DynProductRepository, event_sender: EventSender) -> Self {
        Self {
            repository,
            event_sender,
        }
    }

    /// Validates and persists a new product under a fresh id.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        mut request: CreateProductRequest,
    ) -> Result<Product, ServiceError> {
        let name = request.name.trim().to_string();
        validate_name(&name)?;
        validate_price(request.price)?;
        validate_stock(request.stock)?;
        request.description = non_blank(request.description);
        request.image_url = non_blank(request.image_url);
        request.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            category_id: request.category_id,
            image_url: request.image_url,
            created_at: now,
            updated_at: now,
        };

        let product = self.repository.create(&product).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_id(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.repository
            .get_by_id(id)
            .await
            .map_err(not_found_as_product)
    }

    /// Writes the present fields of `request`. Absent fields, stock in
    /// particular, are left as stored.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        mut request: UpdateProductRequest,
    ) -> Result<Product, ServiceError> {
        // A present but blank text field clears the column.
        let description = request.description.take().map(|d| non_blank(Some(d)));
        let image_url = request.image_url.take().map(|u| non_blank(Some(u)));
        request.description = description.clone().flatten();
        request.image_url = image_url.clone().flatten();
        request.validate()?;

        let mut patch = ProductPatch {
            description,
            image_url,
            category_id: request.category_id,
            ..Default::default()
        };
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            validate_name(&name)?;
            patch.name = Some(name);
        }
        if let Some(price) = request.price {
            validate_price(price)?;
            patch.price = Some(price);
        }
        if let Some(stock) = request.stock {
            validate_stock(stock)?;
            patch.stock = Some(stock);
        }

        let product = self
            .repository
            .update(id, &patch)
            .await
            .map_err(not_found_as_product)?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product.id))
            .await;

        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Lists one page of products. Limit defaults to 20 and is capped at 100.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<ProductListResponse, ServiceError> {
        let limit = match filter.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
        };

        let negative = |price: Option<Decimal>| price.is_some_and(|p| p < Decimal::ZERO);
        if negative(filter.min_price) || negative(filter.max_price) {
            return Err(ServiceError::InvalidPrice);
        }

        let repo_filter = ListFilter {
            category_id: filter.category_id,
            min_price: filter.min_price,
            max_price: filter.max_price,
            search: filter.search,
            order_by: filter.order_by,
            limit,
            offset: filter.offset,
        };

        let mut products = self.repository.list(&repo_filter).await?;

        if filter.in_stock == Some(true) {
            products.retain(Product::in_stock);
        }

        Ok(ProductListResponse {
            total: products.len(),
            products,
            limit,
            offset: filter.offset,
        })
    }

    /// Case-insensitive substring search over name and description.
    /// Out-of-range limits fall back to 20, negative offsets to 0.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::ProductNameRequired);
        }

        let limit = u64::try_from(limit)
            .ok()
            .filter(|limit| (1..=MAX_LIMIT).contains(limit))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = u64::try_from(offset).unwrap_or(0);

        let filter = ListFilter {
            search: Some(query.to_string()),
            limit,
            offset,
            ..Default::default()
        };

        Ok(self.repository.list(&filter).await?)
    }

    /// Whether `quantity` units can currently be reserved.
    #[instrument(skip(self))]
    pub async fn check_availability(&self, id: Uuid, quantity: i32) -> Result<bool, ServiceError> {
        validate_quantity(quantity)?;
        let product = self.get_product_by_id(id).await?;
        Ok(product.stock >= quantity)
    }

    /// Takes `quantity` units out of stock in one atomic statement.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: Uuid, quantity: i32) -> Result<(), ServiceError> {
        validate_quantity(quantity)?;

        if self.repository.update_stock(id, -quantity).await? {
            self.event_sender
                .send_or_log(Event::StockReserved {
                    product_id: id,
                    quantity,
                })
                .await;
            info!(product_id = %id, quantity, "Stock reserved");
            return Ok(());
        }

        // Nothing changed: either the product is gone or stock was too low.
        let product = self.get_product_by_id(id).await?;
        warn!(
            product_id = %id,
            requested = quantity,
            available = product.stock,
            "Insufficient stock for reservation"
        );
        Err(ServiceError::InsufficientStock)
    }

    /// Returns `quantity` units to stock in one atomic statement.
    #[instrument(skip(self))]
    pub async fn release_stock(&self, id: Uuid, quantity: i32) -> Result<(), ServiceError> {
        validate_quantity(quantity)?;

        if !self.repository.update_stock(id, quantity).await? {
            // Nothing changed: either the product is gone or stock would overflow.
            let product = self.get_product_by_id(id).await?;
            warn!(
                product_id = %id,
                released = quantity,
                current = product.stock,
                "Stock release exceeds the stock limit"
            );
            return Err(ServiceError::StockLimitExceeded);
        }

        self.event_sender
            .send_or_log(Event::StockReleased {
                product_id: id,
                quantity,
            })
            .await;
        info!(product_id = %id, quantity, "Stock released");
        Ok(())
    }

    /// Hard-deletes a product; unknown ids are ignored.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        self.repository.delete(id).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
