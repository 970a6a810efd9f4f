//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use record_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::ReferenceNotFound { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::Conflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::TransactionFailure(inner @ StoreError::UniqueViolation { .. })
        | DomainError::Store(inner @ StoreError::UniqueViolation { .. }) => {
            (StatusCode::CONFLICT, inner.to_string())
        }
        DomainError::TransactionFailure(_) | DomainError::Store(_) => {
            tracing::error!(error = %err, "storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        domain_error_to_response(err).0
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(DomainError::not_found("order", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::reference_not_found("product", "x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::invalid_input("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Conflict {
                entity: "customer",
                id: "x".to_string(),
                dependents: 2,
                dependent_noun: "orders",
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::TransactionFailure(
                StoreError::UniqueViolation {
                    entity: "customer",
                    field: "email",
                    value: "a@b.com".to_string(),
                }
            )),
            StatusCode::CONFLICT
        );
    }
}
