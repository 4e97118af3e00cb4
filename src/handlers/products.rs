use crate::handlers::common::{
    map_service_error, no_content_response, parse_optional, parse_product_id, success_response,
    JsonBody,
};
use crate::{
    errors::ApiError,
    repositories::ProductSort,
    services::{CreateProductRequest, ProductFilter, UpdateProductRequest},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

/// Public catalog routes
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/availability", get(check_availability))
}

/// Catalog administration routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/products", post(create_product))
        .route(
            "/admin/products/:id",
            put(update_product).delete(delete_product),
        )
        .route("/admin/products/:id/reserve", post(reserve_stock))
        .route("/admin/products/:id/release", post(release_stock))
}

/// Raw listing query. Values stay strings so that parse failures can be
/// reported per parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    pub category_id: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub in_stock: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListProductsParams {
    pub fn into_filter(self) -> Result<ProductFilter, ApiError> {
        let limit = parse_optional::<u64>(self.limit.as_deref(), "Invalid limit")?;
        if limit == Some(0) {
            return Err(ApiError::BadRequest("Invalid limit".to_string()));
        }

        Ok(ProductFilter {
            category_id: parse_optional(self.category_id.as_deref(), "Invalid category ID")?,
            min_price: parse_optional(self.min_price.as_deref(), "Invalid min_price")?,
            max_price: parse_optional(self.max_price.as_deref(), "Invalid max_price")?,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            in_stock: self
                .in_stock
                .filter(|value| value.trim() == "true")
                .map(|_| true),
            order_by: self
                .order_by
                .as_deref()
                .map(ProductSort::parse_or_default)
                .unwrap_or_default(),
            limit,
            offset: parse_optional(self.offset.as_deref(), "Invalid offset")?.unwrap_or(0),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityParams {
    pub quantity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub available: bool,
}

/// Body of reserve/release requests
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub quantity: i32,
}

#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<Response, ApiError> {
    let filter = params.into_filter()?;

    let page = state
        .services
        .products
        .list_products(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page))
}

#[instrument(skip(state))]
async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let query = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;

    let limit = parse_optional::<i64>(params.limit.as_deref(), "Invalid limit")?;
    if limit.is_some_and(|limit| limit <= 0) {
        return Err(ApiError::BadRequest("Invalid limit".to_string()));
    }
    let offset = parse_optional::<i64>(params.offset.as_deref(), "Invalid offset")?;
    if offset.is_some_and(|offset| offset < 0) {
        return Err(ApiError::BadRequest("Invalid offset".to_string()));
    }

    let products = state
        .services
        .products
        .search_products(&query, limit.unwrap_or(20), offset.unwrap_or(0))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;

    let product = state
        .services
        .products
        .get_product_by_id(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

#[instrument(skip(state))]
async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;
    let quantity = parse_optional::<i32>(params.quantity.as_deref(), "Invalid quantity")?
        .unwrap_or(1);

    let available = state
        .services
        .products
        .check_availability(id, quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(AvailabilityResponse {
        product_id: id,
        quantity,
        available,
    }))
}

#[instrument(skip(state, payload))]
async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<Response, ApiError> {
    let product = state
        .services
        .products
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

#[instrument(skip(state, payload))]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;

    let product = state
        .services
        .products
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

#[instrument(skip(state))]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;

    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

#[instrument(skip(state))]
async fn reserve_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StockRequest>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;
    let products = &state.services.products;

    products
        .reserve_stock(id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    let product = products
        .get_product_by_id(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

#[instrument(skip(state))]
async fn release_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StockRequest>,
) -> Result<Response, ApiError> {
    let id = parse_product_id(&id)?;
    let products = &state.services.products;

    products
        .release_stock(id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    let product = products
        .get_product_by_id(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}
