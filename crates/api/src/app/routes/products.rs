use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/discount", get(resolve_discount))
        .route("/by-code/:code", get(get_product_by_code))
        .route("/:id", get(get_product).patch(update_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let input = match body.into_input() {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_product(input) {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let changes = match body.into_changes() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_product(product_id, changes) {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.get_product(product_id) {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_product_by_code(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.get_product_by_code(&code) {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::PageQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match dto::query(params) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let pagination = services.pagination(params.page, params.page_size);

    match services.list_products(pagination) {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(dto::page_to_json(items, pagination))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// `GET /products/discount?code=..&amount=..` (or `?id=..`).
pub async fn resolve_discount(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::DiscountQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match dto::query(params) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let product = match params.product_ref() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let amount = match params.amount() {
        Ok(a) => a,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_amount", msg),
    };

    match services.resolve_discount(&product, amount) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::pricing_error_to_response(e),
    }
}
