//! Products domain module.
//!
//! Products carry a unique human-readable code, an optional discount override
//! and an optional attachment to a category. Pure domain logic only; code
//! uniqueness across products is enforced by the store.

pub mod product;

pub use product::{
    CreateProduct, Product, ProductCategoryChanged, ProductCommand, ProductCreated,
    ProductDiscountChanged, ProductEvent, ProductId, ProductRecoded, ProductRenamed,
    UpdateProduct,
};
