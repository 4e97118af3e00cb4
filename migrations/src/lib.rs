pub use sea_orm_migration::prelude::*;

mod m20250105_000017_create_products_table;

pub use m20250105_000017_create_products_table::Products;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250105_000017_create_products_table::Migration)]
    }
}
