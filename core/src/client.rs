//! REST client with a result-or-fallback contract.
//!
//! # Design
//! Every operation is split into a `build_*` method that shapes an
//! `HttpRequest` (headers, body, query) and an async method that sends it
//! through the interceptor pipeline. A request failure (serialization,
//! transport, non-2xx status) is logged, reported to the `MessageSink` and
//! replaced by the configured fallback value. A token store that cannot be
//! read is not a request failure: the operation returns the `StorageError`
//! and nothing is sent. A 2xx response resolves to `Outcome::Completed`; its
//! payload is not mapped.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{ApiError, StorageError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::{BearerAuth, Interceptor, Next, PassThrough};
use crate::messages::MessageSink;
use crate::outcome::Outcome;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::token::TokenStore;
use crate::transport::Transport;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Generic CRUD client over JSON and form-encoded payloads.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    messages: Arc<dyn MessageSink>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    fallback: Value,
}

impl ApiClient {
    /// Creates a client with a pass-through pipeline and an empty-array
    /// fallback. An empty `base_url` means every path must be absolute.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
            messages,
            interceptors: vec![Arc::new(PassThrough)],
            fallback: Value::Array(Vec::new()),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        let storage: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        let tokens = TokenStore::new(storage);
        let stage: Arc<dyn Interceptor> = if config.attach_bearer {
            Arc::new(BearerAuth::new(tokens.clone()))
        } else {
            Arc::new(PassThrough)
        };
        Self::new(&config.base_url, transport, tokens, messages)
            .with_fallback(config.fallback.clone())
            .with_interceptors(vec![stage])
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replaces the whole pipeline. Stages run in order before the transport.
    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_create<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, path, body)
    }

    pub fn build_create_with_form_data<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.form_request(HttpMethod::Post, path, body)
    }

    /// GET with `params` as the query string. `params` must serialize to an
    /// object or null; null-valued keys are dropped.
    pub fn build_read<P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<HttpRequest, ApiError> {
        let params = to_value(params)?;
        let mut request = self.request(HttpMethod::Get, path, JSON_CONTENT_TYPE)?;
        request.query = match &params {
            Value::Null => Vec::new(),
            Value::Object(map) => query_pairs(map),
            other => {
                return Err(ApiError::InvalidBody(format!(
                    "query parameters must be an object, got {}",
                    kind(other)
                )))
            }
        };
        Ok(request)
    }

    pub fn build_update<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, path, body)
    }

    pub fn build_update_with_form_data<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.form_request(HttpMethod::Put, path, body)
    }

    pub fn build_delete(&self, path: &str) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, path, JSON_CONTENT_TYPE)
    }

    // -----------------------------------------------------------------------
    // Operations
    //
    // Request failures resolve to `Outcome::Fallback`; only an unreadable
    // token store surfaces as `Err`.
    // -----------------------------------------------------------------------

    pub async fn create<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome, StorageError> {
        let request = self.build_create(path, body);
        self.execute("create", path, request).await
    }

    pub async fn create_with_form_data<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome, StorageError> {
        let request = self.build_create_with_form_data(path, body);
        self.execute("createWithFormData", path, request).await
    }

    pub async fn read<P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<Outcome, StorageError> {
        let request = self.build_read(path, params);
        self.execute("read", path, request).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome, StorageError> {
        let request = self.build_update(path, body);
        self.execute("update", path, request).await
    }

    pub async fn update_with_form_data<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome, StorageError> {
        let request = self.build_update_with_form_data(path, body);
        self.execute("updateWithFormData", path, request).await
    }

    pub async fn delete(&self, path: &str) -> Result<Outcome, StorageError> {
        let request = self.build_delete(path);
        self.execute("delete", path, request).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn execute(
        &self,
        operation: &'static str,
        path: &str,
        request: Result<HttpRequest, ApiError>,
    ) -> Result<Outcome, StorageError> {
        match self.send(request).await {
            // Response payload is not mapped.
            Ok(_response) => Ok(Outcome::Completed),
            Err(ApiError::Storage(err) | ApiError::Transport(TransportError::Storage(err))) => {
                error!(operation, path, error = %err, "token store unavailable");
                Err(err)
            }
            Err(err) => Ok(self.handle_error(operation, path, err)),
        }
    }

    async fn send(&self, request: Result<HttpRequest, ApiError>) -> Result<HttpResponse, ApiError> {
        let request = request?;
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            query = ?request.query,
            "sending request"
        );
        let response = Next::new(&self.interceptors, self.transport.as_ref())
            .run(request)
            .await?;
        check_status(&response)?;
        Ok(response)
    }

    fn handle_error(&self, operation: &str, path: &str, err: ApiError) -> Outcome {
        error!(operation, path, error = ?err, "request failed");
        self.messages
            .add(format!("ApiClient: {operation} {path} failed: {err}"));
        Outcome::Fallback(self.fallback.clone())
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut request = self.request(method, path, JSON_CONTENT_TYPE)?;
        request.body = Some(body);
        Ok(request)
    }

    fn form_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let fields = form_fields(&to_value(body)?)?;
        let body = serde_urlencoded::to_string(&fields)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut request = self.request(method, path, FORM_CONTENT_TYPE)?;
        request.body = Some(body);
        Ok(request)
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        content_type: &str,
    ) -> Result<HttpRequest, ApiError> {
        let mut request = HttpRequest::new(method, self.url(path));
        request.headers = self.headers(content_type)?;
        Ok(request)
    }

    /// `content-type` and `accept`, plus `authorization` when a token is saved.
    fn headers(&self, content_type: &str) -> Result<Vec<(String, String)>, ApiError> {
        let mut headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        if let Some(token) = self.tokens.bearer_token()? {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        if self.base_url.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("interceptors", &self.interceptors.len())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Query pairs for `params`, skipping null values. Everything else is kept,
/// including empty strings, zero and `false`.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), field_value(value)))
        .collect()
}

/// One form field per key of `body`, which must be a JSON object.
pub fn form_fields(body: &Value) -> Result<Vec<(String, String)>, ApiError> {
    match body {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), field_value(value)))
            .collect()),
        other => Err(ApiError::InvalidBody(format!(
            "form data must be an object, got {}",
            kind(other)
        ))),
    }
}

/// Strings are sent verbatim; every other value as its JSON text.
fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
