pub mod product_service;

pub use product_service::{
    CreateProductRequest, ProductFilter, ProductListResponse, ProductService,
    UpdateProductRequest,
};
