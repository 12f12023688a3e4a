use thiserror::Error;

/// Configuration-class errors: a schema that cannot be used. Reported once
/// through the logging side-channel; the engine stays inert instead of
/// failing hard.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("schema has no current model")]
    MissingCurrentModel,
    #[error("current model {0:?} is not defined in the schema")]
    UnknownCurrentModel(String),
}

/// Failures of engine operations that cross the transport boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no backend configured for remote operations")]
    NoBackend,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Transport failures surfaced by the host's backend implementation.
/// Logged and absorbed; the next keystroke re-triggers the fetch.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("response could not be decoded: {0}")]
    InvalidResponse(String),
    #[error("request timed out")]
    Timeout,
}
