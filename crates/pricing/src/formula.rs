use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::DiscountRate;

/// How a discount value reduces an amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountFormula {
    /// `amount * (100 - discount) / 100`
    #[default]
    Percentage,
    /// `amount - discount`, floored at zero.
    Flat,
}

impl DiscountFormula {
    /// Returns `None` when the computation overflows.
    pub fn apply(self, amount: Decimal, discount: DiscountRate) -> Option<Decimal> {
        let discount = discount.as_decimal();
        let reduced = match self {
            DiscountFormula::Percentage => amount
                .checked_mul(Decimal::ONE_HUNDRED - discount)?
                .checked_div(Decimal::ONE_HUNDRED)?,
            DiscountFormula::Flat => amount.checked_sub(discount)?.max(Decimal::ZERO),
        };
        Some(reduced.normalize())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiscountFormula::Percentage => "percentage",
            DiscountFormula::Flat => "flat",
        }
    }
}

impl FromStr for DiscountFormula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" => Ok(DiscountFormula::Percentage),
            "flat" => Ok(DiscountFormula::Flat),
            other => Err(format!(
                "unknown discount formula '{other}' (expected: percentage, flat)"
            )),
        }
    }
}

impl core::fmt::Display for DiscountFormula {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(p: u32) -> DiscountRate {
        DiscountRate::from_percent(p).unwrap()
    }

    #[test]
    fn percentage_takes_a_share_of_the_amount() {
        let out = DiscountFormula::Percentage
            .apply(Decimal::from(1000), rate(5))
            .unwrap();
        assert_eq!(out, Decimal::from(950));
    }

    #[test]
    fn full_percentage_discount_is_free() {
        let out = DiscountFormula::Percentage
            .apply(Decimal::from(80), rate(100))
            .unwrap();
        assert_eq!(out, Decimal::ZERO);
    }

    #[test]
    fn flat_subtracts_and_floors_at_zero() {
        assert_eq!(
            DiscountFormula::Flat.apply(Decimal::from(1000), rate(5)).unwrap(),
            Decimal::from(995)
        );
        assert_eq!(
            DiscountFormula::Flat.apply(Decimal::from(3), rate(5)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        assert!(DiscountFormula::Percentage.apply(Decimal::MAX, rate(1)).is_none());
    }

    #[test]
    fn parses_config_values() {
        assert_eq!("Percentage".parse::<DiscountFormula>().unwrap(), DiscountFormula::Percentage);
        assert_eq!("flat".parse::<DiscountFormula>().unwrap(), DiscountFormula::Flat);
        assert!("bogus".parse::<DiscountFormula>().is_err());
    }
}
