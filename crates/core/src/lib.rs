//! `catalog-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog
//! modules (no storage, no HTTP).

pub mod aggregate;
pub mod discount;
pub mod error;
pub mod event;
pub mod id;
pub mod pagination;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use discount::DiscountRate;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::AggregateId;
pub use pagination::Pagination;
pub use value_object::ValueObject;
