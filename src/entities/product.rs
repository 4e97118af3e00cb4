use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key, assigned server-side at creation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Product description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Unit price, always greater than zero
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,

    /// Units on hand, never negative
    pub stock: i32,

    /// Product category ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    /// URL to product image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Model {
    /// Whether at least one unit is on hand
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
            if let ActiveValue::NotSet = active_model.stock {
                active_model.stock = Set(0);
            }
        }

        active_model.updated_at = Set(now);

        if let ActiveValue::Set(price) | ActiveValue::Unchanged(price) = &active_model.price {
            if *price <= Decimal::ZERO {
                return Err(DbErr::Custom(
                    "Validation error: price must be greater than 0".to_string(),
                ));
            }
        }

        if let ActiveValue::Set(stock) | ActiveValue::Unchanged(stock) = &active_model.stock {
            if *stock < 0 {
                return Err(DbErr::Custom(
                    "Validation error: stock must be non-negative".to_string(),
                ));
            }
        }

        Ok(active_model)
    }
}
