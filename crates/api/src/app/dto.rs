use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use catalog_categories::{Category, CategoryId};
use catalog_core::{AggregateRoot, DiscountRate, DomainError, Pagination};
use catalog_pricing::{DiscountQuote, DiscountSource, ProductRef};
use catalog_products::{Product, ProductId};

use crate::app::errors;
use crate::app::services::{CategoryChanges, NewCategory, NewProduct, ProductChanges};

// -------------------------
// Request DTOs
// -------------------------

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub discount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub discount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// `?code=` or `?id=` plus `&amount=`; values stay textual so parse errors
/// map to our own error codes.
#[derive(Debug, Default, Deserialize)]
pub struct DiscountQuery {
    pub code: Option<String>,
    pub id: Option<String>,
    pub amount: Option<String>,
}

// -------------------------
// Extraction helpers
// -------------------------

pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
        })
}

pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    params
        .map(|Query(q)| q)
        .map_err(|rejection| {
            errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
        })
}

// -------------------------
// Request -> domain mapping
// -------------------------

pub fn parse_category_id(raw: &str) -> Result<CategoryId, DomainError> {
    raw.parse()
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, DomainError> {
    raw.parse()
}

fn discount(raw: Option<Decimal>) -> Result<Option<DiscountRate>, DomainError> {
    raw.map(DiscountRate::new).transpose()
}

fn category_ref(raw: Option<String>) -> Result<Option<CategoryId>, DomainError> {
    raw.as_deref().map(parse_category_id).transpose()
}

impl CreateCategoryRequest {
    pub fn into_input(self) -> Result<NewCategory, DomainError> {
        Ok(NewCategory {
            name: self.name,
            discount: discount(self.discount)?,
            parent: category_ref(self.parent)?,
        })
    }
}

impl UpdateCategoryRequest {
    pub fn into_changes(self) -> Result<CategoryChanges, DomainError> {
        Ok(CategoryChanges {
            name: self.name,
            discount: self.discount.map(discount).transpose()?,
            parent: self.parent.map(category_ref).transpose()?,
        })
    }
}

impl CreateProductRequest {
    pub fn into_input(self) -> Result<NewProduct, DomainError> {
        Ok(NewProduct {
            code: self.code,
            name: self.name,
            discount: discount(self.discount)?,
            category: category_ref(self.parent)?,
        })
    }
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, DomainError> {
        Ok(ProductChanges {
            code: self.code,
            name: self.name,
            discount: self.discount.map(discount).transpose()?,
            category: self.parent.map(category_ref).transpose()?,
        })
    }
}

impl DiscountQuery {
    /// Id wins when both selectors are given.
    pub fn product_ref(&self) -> Result<ProductRef, DomainError> {
        if let Some(id) = self.id.as_deref().filter(|v| !v.trim().is_empty()) {
            return Ok(ProductRef::Id(parse_product_id(id)?));
        }
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Ok(ProductRef::Code(code.to_string())),
            _ => Err(DomainError::validation("either 'code' or 'id' is required")),
        }
    }

    pub fn amount(&self) -> Result<Decimal, String> {
        let raw = self
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| "'amount' is required".to_string())?;
        raw.parse::<Decimal>()
            .map_err(|_| format!("'{raw}' is not a valid amount"))
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn rate_to_json(rate: Option<DiscountRate>) -> serde_json::Value {
    serde_json::json!(rate.map(|r| r.as_decimal()))
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "id": category.id_typed().to_string(),
        "name": category.name(),
        "discount": rate_to_json(category.discount()),
        "parent": category.parent().map(|p| p.to_string()),
        "version": category.version(),
        "created_at": category.created_at(),
        "updated_at": category.updated_at(),
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id_typed().to_string(),
        "code": product.code(),
        "name": product.name(),
        "discount": rate_to_json(product.discount()),
        "parent": product.category().map(|c| c.to_string()),
        "version": product.version(),
        "created_at": product.created_at(),
        "updated_at": product.updated_at(),
    })
}

pub fn page_to_json(items: Vec<serde_json::Value>, pagination: Pagination) -> serde_json::Value {
    serde_json::json!({
        "items": items,
        "page": pagination.page,
        "page_size": pagination.page_size,
    })
}

pub fn quote_to_json(quote: &DiscountQuote) -> serde_json::Value {
    serde_json::json!({
        "product_id": quote.product_id.to_string(),
        "amount": quote.amount,
        "discount": quote.discount_or_sentinel(),
        "amount_after_discount": quote.amount_after_discount,
        "discount_source": quote.source,
    })
}

pub fn category_discount_to_json(
    category_id: CategoryId,
    rate: Option<DiscountRate>,
    source: DiscountSource,
) -> serde_json::Value {
    serde_json::json!({
        "category_id": category_id.to_string(),
        "discount": rate.map(|r| r.as_decimal()).unwrap_or(DiscountQuote::NO_DISCOUNT),
        "discount_source": source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let absent: UpdateCategoryRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.discount, None);
        assert_eq!(absent.parent, None);

        let cleared: UpdateCategoryRequest =
            serde_json::from_str(r#"{"discount":null,"parent":null}"#).unwrap();
        assert_eq!(cleared.discount, Some(None));
        assert_eq!(cleared.parent, Some(None));

        let set: UpdateCategoryRequest = serde_json::from_str(r#"{"discount":12.5}"#).unwrap();
        assert_eq!(set.discount, Some(Some(Decimal::new(125, 1))));
    }

    #[test]
    fn out_of_range_discount_is_a_validation_error() {
        let req: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"x","discount":150}"#).unwrap();
        assert!(matches!(req.into_input(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn malformed_parent_is_an_invalid_id() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"code":"c","name":"n","parent":"nope"}"#).unwrap();
        assert!(matches!(req.into_input(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn discount_query_needs_a_selector_and_an_amount() {
        let q = DiscountQuery {
            code: Some(" ABC ".to_string()),
            id: None,
            amount: Some("10.5".to_string()),
        };
        assert_eq!(q.product_ref().unwrap(), ProductRef::Code("ABC".to_string()));
        assert_eq!(q.amount().unwrap(), Decimal::new(105, 1));

        let empty = DiscountQuery::default();
        assert!(empty.product_ref().is_err());
        assert!(empty.amount().is_err());
    }
}
