//! Process configuration read from `CATALOG_*` environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use catalog_core::Pagination;
use catalog_pricing::{DiscountFormula, DiscountResolver};

pub const BIND_ADDR_VAR: &str = "CATALOG_BIND_ADDR";
pub const MAX_CATEGORY_DEPTH_VAR: &str = "CATALOG_MAX_CATEGORY_DEPTH";
pub const DISCOUNT_FORMULA_VAR: &str = "CATALOG_DISCOUNT_FORMULA";
pub const DEFAULT_PAGE_SIZE_VAR: &str = "CATALOG_DEFAULT_PAGE_SIZE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    /// Maximum number of ancestors visited when inheriting a discount.
    pub max_category_depth: usize,
    pub discount_formula: DiscountFormula,
    /// Page size used when a list request names none.
    pub default_page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_category_depth: DiscountResolver::<(), ()>::DEFAULT_MAX_DEPTH,
            discount_formula: DiscountFormula::default(),
            default_page_size: Pagination::DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source; unset or blank
    /// variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get(BIND_ADDR_VAR) {
            config.bind_addr = raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::invalid(BIND_ADDR_VAR, &raw, e.to_string()))?;
        }

        if let Some(raw) = get(MAX_CATEGORY_DEPTH_VAR) {
            let depth: usize = raw
                .parse()
                .map_err(|_| ConfigError::invalid(MAX_CATEGORY_DEPTH_VAR, &raw, "expected a positive integer"))?;
            if depth == 0 {
                return Err(ConfigError::invalid(MAX_CATEGORY_DEPTH_VAR, &raw, "must be at least 1"));
            }
            config.max_category_depth = depth;
        }

        if let Some(raw) = get(DISCOUNT_FORMULA_VAR) {
            config.discount_formula = raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid(DISCOUNT_FORMULA_VAR, &raw, reason))?;
        }

        if let Some(raw) = get(DEFAULT_PAGE_SIZE_VAR) {
            let size: u32 = raw
                .parse()
                .map_err(|_| ConfigError::invalid(DEFAULT_PAGE_SIZE_VAR, &raw, "expected a positive integer"))?;
            if !(1..=Pagination::MAX_PAGE_SIZE).contains(&size) {
                return Err(ConfigError::invalid(
                    DEFAULT_PAGE_SIZE_VAR,
                    &raw,
                    format!("must be between 1 and {}", Pagination::MAX_PAGE_SIZE),
                ));
            }
            config.default_page_size = size;
        }

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}
