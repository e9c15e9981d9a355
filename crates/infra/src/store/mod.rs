//! Record storage for the catalog aggregates.
//!
//! Stores hold the current state of each aggregate and enforce optimistic
//! concurrency on save. The product store also owns the code uniqueness
//! constraint, checked in the same critical section as the write.

pub mod categories;
pub mod products;

use thiserror::Error;

use catalog_core::{AggregateRoot, ExpectedVersion, Pagination};

pub use categories::InMemoryCategoryStore;
pub use products::InMemoryProductStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Stored version differs from the expected one.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// Another product already uses this code.
    #[error("duplicate product code: {0}")]
    DuplicateCode(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Current-state storage for one aggregate type.
pub trait AggregateStore<A: AggregateRoot>: Send + Sync {
    fn load(&self, id: &A::Id) -> Result<Option<A>, StoreError>;

    /// Insert or replace, failing if the stored version does not match
    /// `expected` (version 0 = absent).
    fn save(&self, aggregate: A, expected: ExpectedVersion) -> Result<(), StoreError>;

    /// One page of records in creation order.
    fn list(&self, pagination: Pagination) -> Result<Vec<A>, StoreError>;
}

impl<A, S> AggregateStore<A> for std::sync::Arc<S>
where
    A: AggregateRoot,
    S: AggregateStore<A> + ?Sized,
{
    fn load(&self, id: &A::Id) -> Result<Option<A>, StoreError> {
        (**self).load(id)
    }

    fn save(&self, aggregate: A, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).save(aggregate, expected)
    }

    fn list(&self, pagination: Pagination) -> Result<Vec<A>, StoreError> {
        (**self).list(pagination)
    }
}

fn check_version(expected: ExpectedVersion, actual: u64) -> Result<(), StoreError> {
    if expected.matches(actual) {
        Ok(())
    } else {
        Err(StoreError::Concurrency(format!(
            "expected {expected:?}, found {actual}"
        )))
    }
}
