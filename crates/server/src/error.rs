use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use llm::LlmError;
use runtime::RuntimeError;
use store::StoreError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wire-level error wrapper mapping runtime errors onto HTTP semantics.
pub struct ApiError(pub RuntimeError);

impl From<RuntimeError> for ApiError {
    fn from(error: RuntimeError) -> Self {
        Self(error)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self(RuntimeError::Store(error))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_template: Option<Value>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            RuntimeError::Store(StoreError::Duplicate { .. }) => StatusCode::CONFLICT,
            RuntimeError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            RuntimeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RuntimeError::Validation(_) | RuntimeError::Als(_) => StatusCode::BAD_REQUEST,
            RuntimeError::Guard(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RuntimeError::Llm(error) => match error {
                LlmError::Validation(_) | LlmError::UnsupportedGrounding { .. } => StatusCode::BAD_REQUEST,
                LlmError::GroundingRequired { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                LlmError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                LlmError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
                LlmError::AuthenticationFailed(_) | LlmError::ProviderTransport { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                LlmError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_type(&self) -> String {
        match &self.0 {
            RuntimeError::Store(StoreError::Duplicate { .. }) => "duplicate_template".to_owned(),
            RuntimeError::Store(StoreError::NotFound(_)) => "not_found".to_owned(),
            RuntimeError::Store(_) => "store_error".to_owned(),
            RuntimeError::Validation(_) | RuntimeError::Als(_) => "validation_error".to_owned(),
            RuntimeError::Guard(_) => "internal_error".to_owned(),
            RuntimeError::Llm(error) => error.kind().as_str().to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Duplicates carry the existing template so the caller can adopt
        // it instead of editing the identity blindly.
        let existing_template = match &self.0 {
            RuntimeError::Store(StoreError::Duplicate { existing }) => Some(json!({
                "id": existing.id,
                "name": existing.name,
                "created_at": existing.created_at,
            })),
            _ => None,
        };

        let message = match &self.0 {
            RuntimeError::Llm(error) => error.client_message(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                message,
                r#type: self.error_type(),
                code: status.as_u16(),
                existing_template,
            },
        };

        (status, Json(body)).into_response()
    }
}
