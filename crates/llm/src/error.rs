use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Adapter and orchestrator errors. Each variant maps to one class of
/// caller reaction; see [`LlmError::kind`].
#[derive(Debug, Error)]
pub enum LlmError {
    /// Malformed run request: oversized ALS block, unknown provider,
    /// non-object schema, missing model.
    #[error("invalid run request: {0}")]
    Validation(String),

    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider asked us to slow down.
    #[error("rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        /// Advisory from the provider, surfaced to the caller; the core
        /// itself never retries.
        retry_after: Option<Duration>,
    },

    /// Timeout, connection failure or a 5xx from the provider.
    #[error("provider transport error ({status:?}): {message}")]
    ProviderTransport { status: Option<u16>, message: String },

    /// REQUIRED grounding, but the provider reported no tool use and no
    /// grounding chunks. The run fails closed; nothing is persisted.
    #[error("grounding required but '{model_id}' produced no grounding evidence")]
    GroundingRequired { model_id: String },

    /// Grounding requested on a model outside the grounding allow-list.
    #[error("model '{model_id}' does not support grounded requests")]
    UnsupportedGrounding { model_id: String },

    /// The hard wall-clock deadline elapsed; the in-flight provider call
    /// was cancelled and partial evidence discarded.
    #[error("run exceeded its deadline after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// Response we could not make sense of. `Some` carries a provider
    /// message safe to show; `None` is an internal failure.
    #[error("internal provider error")]
    Internal(Option<String>),
}

/// Stable error taxonomy recorded in failure rows and surfaced over the
/// wire. Never renamed once persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    AuthenticationError,
    ProviderTransportError,
    GroundingRequiredError,
    UnsupportedGroundingError,
    DeadlineExceeded,
    InternalError,
}

impl ErrorKind {
    /// Snake-case label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::AuthenticationError => "authentication_error",
            Self::ProviderTransportError => "provider_transport_error",
            Self::GroundingRequiredError => "grounding_required_error",
            Self::UnsupportedGroundingError => "unsupported_grounding_error",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::InternalError => "internal_error",
        }
    }
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationError,
            Self::RateLimited { .. } | Self::ProviderTransport { .. } => ErrorKind::ProviderTransportError,
            Self::GroundingRequired { .. } => ErrorKind::GroundingRequiredError,
            Self::UnsupportedGrounding { .. } => ErrorKind::UnsupportedGroundingError,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Whether a fresh attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ProviderTransport { .. } | Self::DeadlineExceeded { .. }
        )
    }

    /// Map a non-success provider HTTP status to an error, following the
    /// same status buckets for every adapter.
    pub(crate) fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(message),
            429 => Self::RateLimited { message, retry_after },
            400 | 404 | 422 => Self::Validation(message),
            500..=599 => Self::ProviderTransport {
                status: Some(status),
                message,
            },
            _ => Self::ProviderTransport {
                status: Some(status),
                message,
            },
        }
    }

    /// Message that is safe to expose to API consumers.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(Some(provider_message)) => provider_message.clone(),
            Self::Internal(None) => "internal provider error".to_owned(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_buckets() {
        assert!(matches!(
            LlmError::from_status(401, "no".into(), None),
            LlmError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            LlmError::from_status(429, "slow".into(), None),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from_status(503, "down".into(), None),
            LlmError::ProviderTransport { status: Some(503), .. }
        ));
        assert!(matches!(
            LlmError::from_status(400, "bad".into(), None),
            LlmError::Validation(_)
        ));
    }

    #[test]
    fn transport_errors_are_retryable_and_grounding_failures_are_not() {
        let transport = LlmError::ProviderTransport {
            status: Some(502),
            message: "bad gateway".into(),
        };
        assert!(transport.is_retryable());
        assert_eq!(transport.kind(), ErrorKind::ProviderTransportError);

        let grounding = LlmError::GroundingRequired {
            model_id: "gpt-5".into(),
        };
        assert!(!grounding.is_retryable());
        assert_eq!(grounding.kind(), ErrorKind::GroundingRequiredError);
    }
}
