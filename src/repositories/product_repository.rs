use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait,
    ActiveValue::{NotSet, Unchanged},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::debug;
use uuid::Uuid;

use crate::entities::product::{self, Column, Entity as ProductEntity, Model as Product};
use crate::errors::RepositoryError;
use crate::repositories::Repository;

use super::BaseRepository;

pub type DynProductRepository = Arc<dyn ProductRepository>;

/// Sort orders accepted by product listings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    CreatedAtDesc,
}

impl ProductSort {
    /// Parses a sort key, falling back to newest-first for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }

    fn apply(self, query: Select<ProductEntity>) -> Select<ProductEntity> {
        match self {
            ProductSort::PriceAsc => query.order_by_asc(Column::Price),
            ProductSort::PriceDesc => query.order_by_desc(Column::Price),
            ProductSort::NameAsc => query.order_by_asc(Column::Name),
            ProductSort::NameDesc => query.order_by_desc(Column::Name),
            ProductSort::CreatedAtDesc => query.order_by_desc(Column::CreatedAt),
        }
    }
}

/// Query descriptor for product listings. Absent fields add no predicate;
/// `limit`/`offset` of zero are left out of the statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub order_by: ProductSort,
    pub limit: u64,
    pub offset: u64,
}

impl ListFilter {
    fn into_select(self) -> Select<ProductEntity> {
        let mut query = ProductEntity::find();

        if let Some(category_id) = self.category_id {
            query = query.filter(Column::CategoryId.eq(category_id));
        }

        if let Some(min_price) = self.min_price {
            query = query.filter(Column::Price.gte(min_price));
        }

        if let Some(max_price) = self.max_price {
            query = query.filter(Column::Price.lte(max_price));
        }

        if let Some(term) = self.search.filter(|term| !term.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
            );
        }

        query = self.order_by.apply(query);

        if self.limit > 0 {
            query = query.limit(self.limit);
        }

        if self.offset > 0 {
            query = query.offset(self.offset);
        }

        query
    }
}

/// Column changes for a partial update. `None` leaves a column untouched;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<Option<String>>,
}

impl ProductPatch {
    fn into_active_model(self, id: Uuid) -> product::ActiveModel {
        product::ActiveModel {
            id: Unchanged(id),
            name: self.name.map_or(NotSet, Set),
            description: self.description.map_or(NotSet, Set),
            price: self.price.map_or(NotSet, Set),
            stock: self.stock.map_or(NotSet, Set),
            category_id: self.category_id.map_or(NotSet, |category| Set(Some(category))),
            image_url: self.image_url.map_or(NotSet, Set),
            created_at: NotSet,
            updated_at: NotSet,
        }
    }
}

/// Persistence contract for products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product row.
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError>;

    /// Fetches a product, `NotFound` when no row matches.
    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError>;

    /// Runs a filtered, ordered, paginated listing.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Stamps `updated_at` without touching any other column.
    async fn touch(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Writes only the columns present in `patch` and returns the stored row.
    async fn update(&self, id: Uuid, patch: &ProductPatch) -> Result<Product, RepositoryError>;

    /// Adds `delta` to stock in a single statement, refusing to leave the
    /// `0..=i32::MAX` range. Returns `false` when no row was changed.
    async fn update_stock(&self, id: Uuid, delta: i32) -> Result<bool, RepositoryError>;

    /// Removes the row. Deleting an absent id is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// sea-orm backed product repository
#[derive(Debug, Clone)]
pub struct DbProductRepository {
    base: BaseRepository,
}

impl DbProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn to_active_model(product: &Product) -> product::ActiveModel {
    product::ActiveModel {
        id: Set(product.id),
        name: Set(product.name.clone()),
        description: Set(product.description.clone()),
        price: Set(product.price),
        stock: Set(product.stock),
        category_id: Set(product.category_id),
        image_url: Set(product.image_url.clone()),
        created_at: Set(product.created_at),
        updated_at: Set(product.updated_at),
    }
}

#[async_trait]
impl ProductRepository for DbProductRepository {
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError> {
        to_active_model(product)
            .insert(self.get_db())
            .await
            .map_err(RepositoryError::database("create product"))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError> {
        ProductEntity::find_by_id(id)
            .one(self.get_db())
            .await
            .map_err(RepositoryError::database("get product"))?
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Product>, RepositoryError> {
        debug!(?filter, "listing products");
        filter
            .clone()
            .into_select()
            .all(self.get_db())
            .await
            .map_err(RepositoryError::database("list products"))
    }

    async fn touch(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = ProductEntity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(self.get_db())
            .await
            .map_err(RepositoryError::database("update product"))?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ProductPatch) -> Result<Product, RepositoryError> {
        patch
            .clone()
            .into_active_model(id)
            .update(self.get_db())
            .await
            .map_err(RepositoryError::database("update product"))
    }

    async fn update_stock(&self, id: Uuid, delta: i32) -> Result<bool, RepositoryError> {
        let guard = if delta < 0 {
            Column::Stock.gte(delta.saturating_neg())
        } else {
            Column::Stock.lte(i32::MAX - delta)
        };

        let result = ProductEntity::update_many()
            .col_expr(Column::Stock, Expr::col(Column::Stock).add(delta))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(guard)
            .exec(self.get_db())
            .await
            .map_err(RepositoryError::database("update product stock"))?;

        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = ProductEntity::delete_by_id(id)
            .exec(self.get_db())
            .await
            .map_err(RepositoryError::database("delete product"))?;

        debug!(product_id = %id, rows = result.rows_affected, "product delete executed");
        Ok(())
    }
}

impl Repository for DbProductRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
