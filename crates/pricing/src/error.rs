use thiserror::Error;

use catalog_categories::CategoryId;

use crate::lookup::{LookupError, ProductRef};

/// Failures of a discount resolution.
///
/// "No discount applies" is not an error; see [`crate::DiscountSource::None`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("product not found ({0})")]
    ProductNotFound(ProductRef),

    /// A parent reference in the chain no longer resolves.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("category cycle detected at {category_id}")]
    CategoryCycleDetected { category_id: CategoryId },

    #[error("category chain deeper than {max_depth}")]
    CategoryDepthExceeded { max_depth: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A store failed while the chain was being read.
    #[error(transparent)]
    Store(#[from] LookupError),
}
