//! Discount resolution.
//!
//! Given a product and a purchase amount, decide which discount governs the
//! product (its own override, else the nearest ancestor category's) and
//! compute the discounted amount. The stores are consumed through the
//! read-only [`CategoryLookup`] / [`ProductLookup`] traits.

pub mod error;
pub mod formula;
pub mod lookup;
pub mod resolver;

pub use error::PricingError;
pub use formula::DiscountFormula;
pub use lookup::{
    CategoryLink, CategoryLookup, LookupError, ProductLink, ProductLookup, ProductRef,
};
pub use resolver::{DiscountQuote, DiscountResolver, DiscountSource};
