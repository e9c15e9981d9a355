use chrono::{DateTime, Utc};

/// A catalog change, emitted by an aggregate's `handle` and folded in by `apply`.
///
/// Events are immutable facts. The type name is stable and used in logs
/// (e.g. "catalog.category.updated").
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier.
    fn event_type(&self) -> &'static str;

    /// When the change occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
