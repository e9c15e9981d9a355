use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::DomainError;
use catalog_infra::command_dispatcher::DispatchError;
use catalog_pricing::PricingError;

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::DuplicateCode(code) => json_error(
            StatusCode::CONFLICT,
            "duplicate_code",
            format!("product code '{code}' is already in use"),
        ),
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DispatchError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn pricing_error_to_response(err: PricingError) -> axum::response::Response {
    match &err {
        PricingError::ProductNotFound(_) | PricingError::CategoryNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        PricingError::CategoryCycleDetected { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "category_cycle", err.to_string())
        }
        PricingError::CategoryDepthExceeded { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "category_depth_exceeded",
            err.to_string(),
        ),
        PricingError::InvalidAmount(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", msg.clone())
        }
        PricingError::Store(e) => {
            tracing::error!(error = %e, "store failure during discount resolution");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

/// Rejections raised while mapping request DTOs to domain values.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        other => dispatch_error_to_response(other.into()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use catalog_pricing::LookupError;

    use super::*;

    #[test]
    fn lookup_failure_is_a_server_error() {
        let resp = pricing_error_to_response(PricingError::Store(LookupError(
            "store lock poisoned".to_string(),
        )));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_product_is_not_found() {
        let resp = pricing_error_to_response(PricingError::ProductNotFound(
            catalog_pricing::ProductRef::Code("X".to_string()),
        ));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
