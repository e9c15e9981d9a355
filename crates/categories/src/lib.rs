//! Categories domain module.
//!
//! Categories form a tree through their optional `parent` reference and may
//! carry a discount override that descendants inherit. This crate holds the
//! aggregate and its rules only (no IO, no HTTP, no storage).

pub mod category;

pub use category::{
    Category, CategoryCommand, CategoryCreated, CategoryDiscountChanged, CategoryEvent,
    CategoryId, CategoryMoved, CategoryRenamed, CreateCategory, UpdateCategory,
};
