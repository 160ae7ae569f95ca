//! Request pipeline stages that run before the transport.
//!
//! # Design
//! A stage receives the outgoing request and a `Next` handle for the rest of
//! the pipeline. `Next::run` consumes the handle, so a stage forwards at most
//! once; since it must produce a response, it forwards exactly once unless it
//! fails.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::token::TokenStore;
use crate::transport::Transport;

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError>;
}

/// The remaining interceptors followed by the transport.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a dyn Transport) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    pub async fn run(self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.interceptors.split_first() {
            Some((stage, rest)) => stage.intercept(request, Next::new(rest, self.transport)).await,
            None => self.transport.send(request).await,
        }
    }
}

/// Forwards every request unmodified.
///
/// Default stage. Header sets built by `ApiClient` already carry the bearer
/// token.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl Interceptor for PassThrough {
    async fn intercept(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        next.run(request).await
    }
}

/// Sets `authorization: Bearer <token>` when the token store holds a token.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    tokens: TokenStore,
}

impl BearerAuth {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl Interceptor for BearerAuth {
    async fn intercept(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        let token = self.tokens.bearer_token()?;
        if let Some(token) = token {
            debug!(path = %request.path, "attaching bearer token");
            request.set_header("authorization", format!("Bearer {token}"));
        }
        next.run(request).await
    }
}
