//! Discount percentage value object.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A discount percentage in `[0, 100]`.
///
/// Zero is a real value ("explicitly no discount") and is distinct from an
/// absent override.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    pub const MAX: Decimal = Decimal::ONE_HUNDRED;

    pub fn new(percent: Decimal) -> DomainResult<Self> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(DomainError::validation("discount cannot be negative"));
        }
        if percent > Self::MAX {
            return Err(DomainError::validation("discount cannot exceed 100 percent"));
        }
        Ok(Self(percent.normalize()))
    }

    /// Build from a whole-number percentage (handy in tests and fixtures).
    pub fn from_percent(percent: u32) -> DomainResult<Self> {
        Self::new(Decimal::from(percent))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl ValueObject for DiscountRate {}

impl TryFrom<Decimal> for DiscountRate {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountRate> for Decimal {
    fn from(value: DiscountRate) -> Self {
        value.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
