//! Read-only views of the stores consumed by the resolver.

use std::sync::Arc;

use thiserror::Error;

use catalog_categories::CategoryId;
use catalog_core::DiscountRate;
use catalog_products::ProductId;

/// How a caller names the product to price.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductRef {
    Id(ProductId),
    Code(String),
}

impl core::fmt::Display for ProductRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProductRef::Id(id) => write!(f, "id {id}"),
            ProductRef::Code(code) => write!(f, "code {code}"),
        }
    }
}

/// The two category fields the ancestor walk needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLink {
    pub id: CategoryId,
    pub discount: Option<DiscountRate>,
    pub parent: Option<CategoryId>,
}

/// The two product fields resolution starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLink {
    pub id: ProductId,
    pub discount: Option<DiscountRate>,
    pub category: Option<CategoryId>,
}

/// The backing store could not be read; distinct from "no such record".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("lookup failed: {0}")]
pub struct LookupError(pub String);

pub trait CategoryLookup: Send + Sync {
    /// `Ok(None)` when no category has this id.
    fn category_link(&self, id: CategoryId) -> Result<Option<CategoryLink>, LookupError>;
}

pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` when no product matches.
    fn product_link(&self, product: &ProductRef) -> Result<Option<ProductLink>, LookupError>;
}

impl<S> CategoryLookup for Arc<S>
where
    S: CategoryLookup + ?Sized,
{
    fn category_link(&self, id: CategoryId) -> Result<Option<CategoryLink>, LookupError> {
        (**self).category_link(id)
    }
}

impl<S> ProductLookup for Arc<S>
where
    S: ProductLookup + ?Sized,
{
    fn product_link(&self, product: &ProductRef) -> Result<Option<ProductLink>, LookupError> {
        (**self).product_link(product)
    }
}
