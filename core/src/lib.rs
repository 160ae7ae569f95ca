//! Client-side REST access layer.
//!
//! # Overview
//! `ApiClient` wraps a `Transport` with CRUD helpers for JSON and
//! form-encoded payloads. It reads the bearer token from a `TokenStore`,
//! sends each request through a pipeline of `Interceptor` stages, and
//! resolves every request failure with an `Outcome` instead of an error.
//!
//! # Design
//! - `TokenStore` sits on an injected `KeyValueStore`, so tests use
//!   `MemoryStore` and long-lived sessions use `FileStore`.
//! - Request shaping (`build_*`) is pure apart from the token lookup; the
//!   async operations add the pipeline and failure handling.
//! - Request failures are logged with `tracing`, reported to a
//!   `MessageSink`, and collapsed into `Outcome::Fallback`. An unreadable
//!   token store is returned to the caller as `StorageError`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod messages;
pub mod outcome;
pub mod storage;
pub mod token;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, StorageError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{BearerAuth, Interceptor, Next, PassThrough};
pub use messages::{MessageLog, MessageSink};
pub use outcome::Outcome;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use token::TokenStore;
pub use transport::{ReqwestTransport, Transport};
