//! Error types for the storage, transport and client layers.
//!
//! # Design
//! `ApiError` never reaches callers of `ApiClient` operations: it exists so
//! the failure handler can log a precise message before substituting the
//! fallback value. `StorageError` is different: a broken token store has no
//! sensible fallback, so `TokenStore` and every `ApiClient` operation return
//! it to the caller.

use thiserror::Error;

/// Failures of a `KeyValueStore` backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted file exists but is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Failures raised while sending a request through the pipeline.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be delivered or no response was read.
    #[error("transport failed: {0}")]
    Send(String),

    /// An interceptor refused to forward the request.
    #[error("interceptor failed: {0}")]
    Interceptor(String),

    /// An interceptor could not read the token store.
    #[error("token lookup failed: {0}")]
    Storage(#[from] StorageError),
}

/// Everything that can go wrong inside one `ApiClient` operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Form operations need a JSON object body.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("token lookup failed: {0}")]
    Storage(#[from] StorageError),
}
