use thiserror::Error;

/// Umbrella error for runtime operations. Adapter and store errors pass
/// through untranslated so callers can react per kind.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Llm(#[from] llm::LlmError),

    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error(transparent)]
    Als(#[from] als::AlsError),

    #[error("probe guard error: {0}")]
    Guard(String),

    #[error("validation error: {0}")]
    Validation(String),
}
