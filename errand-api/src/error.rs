use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use errand_order::OrderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    GoneError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GoneError(msg) => (StatusCode::GONE, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            OrderError::SelfReceiveForbidden | OrderError::Unauthorized => {
                AppError::AuthorizationError(err.to_string())
            }
            OrderError::AlreadyReceived | OrderError::Conflict(_) => {
                AppError::ConflictError(err.to_string())
            }
            OrderError::OrderDeleted => AppError::GoneError(err.to_string()),
            OrderError::InvalidTimeWindow => AppError::ValidationError(err.to_string()),
            OrderError::Storage(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}
