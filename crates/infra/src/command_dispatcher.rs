//! Command execution pipeline for the catalog aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load current state from the store (or start from an empty aggregate)
//!   ↓
//! 2. Handle command (pure decision logic, produces events)
//!   ↓
//! 3. Apply events to a copy of the state
//!   ↓
//! 4. Save with an expected-version check (store enforces uniqueness rules)
//! ```
//!
//! The dispatcher contains no IO itself; it composes an [`AggregateStore`].

use thiserror::Error;

use catalog_core::{Aggregate, DomainError, Event, ExpectedVersion};

use crate::store::{AggregateStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Optimistic concurrency failure or a repeated create.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Product code already taken by another product.
    #[error("duplicate product code: {0}")]
    DuplicateCode(String),
    /// Domain validation failure (deterministic).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Domain invariant failure (deterministic).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// Target aggregate does not exist.
    #[error("not found")]
    NotFound,
    /// The store could not be read or written.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => DispatchError::Conflict(msg),
            StoreError::DuplicateCode(code) => DispatchError::DuplicateCode(code),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Runs commands against aggregates held in a store `S`.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> CommandDispatcher<S> {
    /// Dispatch a command and return the aggregate's resulting state.
    ///
    /// `make_aggregate` builds the empty instance used when nothing is stored
    /// under `id` yet. A command that decides no events returns the current
    /// state without writing.
    pub fn dispatch<A>(
        &self,
        id: A::Id,
        command: A::Command,
        make_aggregate: impl FnOnce(A::Id) -> A,
    ) -> Result<A, DispatchError>
    where
        S: AggregateStore<A>,
        A: Aggregate<Error = DomainError> + Clone,
        A::Event: Event,
    {
        // 1) Load current state
        let mut aggregate = match self.store.load(&id)? {
            Some(existing) => existing,
            None => make_aggregate(id.clone()),
        };
        let expected = ExpectedVersion::Exact(aggregate.version());

        // 2) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(|e| {
            tracing::warn!(aggregate_id = ?id, error = %e, "command rejected");
            DispatchError::from(e)
        })?;
        if decided.is_empty() {
            return Ok(aggregate);
        }

        // 3) Evolve state
        for event in &decided {
            aggregate.apply(event);
        }

        // 4) Persist (optimistic)
        self.store.save(aggregate.clone(), expected).map_err(|e| {
            tracing::warn!(aggregate_id = ?id, error = %e, "save rejected");
            DispatchError::from(e)
        })?;

        for event in &decided {
            tracing::info!(
                aggregate_id = ?id,
                event_type = event.event_type(),
                version = aggregate.version(),
                "catalog change committed"
            );
        }

        Ok(aggregate)
    }
}
