//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values
/// (e.g. a discount rate of 5% equals any other 5% rate). They are immutable;
/// "changing" one means constructing a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
