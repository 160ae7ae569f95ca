use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
}

/// Body of create and update requests, accepted as JSON or form fields.
#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub active: Option<bool>,
}

/// What the server saw of one API request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
pub struct AppState {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

pub fn app() -> Router {
    let state = AppState::default();
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/v1/broken", any(broken))
        .route_layer(middleware::from_fn_with_state(state.clone(), record_request))
        .route("/__debug/requests", get(list_requests))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        content_type: header_value(headers, header::CONTENT_TYPE),
        accept: header_value(headers, header::ACCEPT),
        authorization: header_value(headers, header::AUTHORIZATION),
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "recorded request");
    state.requests.write().await.push(recorded);
    next.run(request).await
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Decode a body as form fields or JSON, chosen by `content-type`.
fn parse_input(headers: &HeaderMap, body: &Bytes) -> Result<UserInput, StatusCode> {
    let is_form = header_value(headers, header::CONTENT_TYPE)
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        serde_urlencoded::from_bytes(body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)
    } else {
        serde_json::from_slice(body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)
    }
}

async fn list_requests(State(state): State<AppState>) -> Json<Vec<RecordedRequest>> {
    Json(state.requests.read().await.clone())
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<User>> {
    let users = state.users.read().await;
    let mut users: Vec<User> = users
        .values()
        .filter(|u| params.active.map_or(true, |active| u.active == active))
        .cloned()
        .collect();
    users.sort_by(|a, b| a.name.cmp(&b.name));
    Json(users)
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    let input = parse_input(&headers, &body)?;
    let name = input.name.ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    let user = User {
        id: Uuid::new_v4(),
        name,
        email: input.email.unwrap_or_default(),
        active: input.active.unwrap_or(true),
    };
    state.users.write().await.insert(user.id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, StatusCode> {
    let users = state.users.read().await;
    users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<User>, StatusCode> {
    let input = parse_input(&headers, &body)?;
    let mut users = state.users.write().await;
    let user = users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(active) = input.active {
        user.active = active;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut users = state.users.write().await;
    users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "broken on purpose")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_to_json() {
        let user = User {
            id: Uuid::nil(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            active: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["active"], true);
    }

    #[test]
    fn json_input_fields_are_optional() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let input = parse_input(&headers, &Bytes::from_static(b"{}")).unwrap();
        assert!(input.name.is_none());
        assert!(input.active.is_none());
    }

    #[test]
    fn form_input_parses_booleans() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        let input = parse_input(&headers, &Bytes::from_static(b"name=Ada+L&active=false")).unwrap();
        assert_eq!(input.name.as_deref(), Some("Ada L"));
        assert_eq!(input.active, Some(false));
    }

    #[test]
    fn malformed_body_is_unprocessable() {
        let headers = HeaderMap::new();
        let err = parse_input(&headers, &Bytes::from_static(b"not json")).unwrap_err();
        assert_eq!(err, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
