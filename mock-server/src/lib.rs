use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "ada@eventio.test";
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: String,
    pub capacity: u32,
    pub owner: User,
    pub attendees: Vec<User>,
}

/// Either credentials or a refresh token; the login endpoint takes both.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum LoginInput {
    #[serde(rename_all = "camelCase")]
    Refresh { refresh_token: String },
    Credentials { email: String, password: String },
}

#[derive(Default)]
pub struct Backend {
    pub users: HashMap<Uuid, (User, String)>,
    pub events: Vec<Event>,
    pub access_tokens: HashMap<String, Uuid>,
    pub refresh_tokens: HashMap<String, Uuid>,
}

#[derive(Clone)]
pub struct AppState {
    pub api_key: Arc<str>,
    pub backend: Arc<RwLock<Backend>>,
}

pub fn seeded() -> Backend {
    let ada = User {
        id: Uuid::new_v4(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: DEMO_EMAIL.to_string(),
    };
    let events = vec![
        Event {
            id: Uuid::new_v4(),
            title: "Rust meetup".to_string(),
            description: "Talks and pizza".to_string(),
            starts_at: "2030-05-01T18:00:00Z".to_string(),
            capacity: 40,
            owner: ada.clone(),
            attendees: vec![ada.clone()],
        },
        Event {
            id: Uuid::new_v4(),
            title: "Retro night".to_string(),
            description: "Board games".to_string(),
            starts_at: "2020-01-10T19:00:00Z".to_string(),
            capacity: 12,
            owner: ada.clone(),
            attendees: Vec::new(),
        },
    ];
    let mut users = HashMap::new();
    users.insert(ada.id, (ada, DEMO_PASSWORD.to_string()));
    Backend {
        users,
        events,
        ..Backend::default()
    }
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        backend: Arc::new(RwLock::new(seeded())),
    };
    Router::new()
        .route("/auth/native", post(login))
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/me", get(me))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match request.headers().get("APIKey").and_then(|v| v.to_str().ok()) {
        Some(key) if key == &*state.api_key => next.run(request).await,
        _ => unauthorized("invalid API key"),
    }
}

/// Issue a fresh token pair for `user_id` and return it as rotation headers.
fn rotate(backend: &mut Backend, user_id: Uuid) -> HeaderMap {
    let access = Uuid::new_v4().to_string();
    let refresh = Uuid::new_v4().to_string();
    backend.access_tokens.retain(|_, id| *id != user_id);
    backend.refresh_tokens.retain(|_, id| *id != user_id);
    backend.access_tokens.insert(access.clone(), user_id);
    backend.refresh_tokens.insert(refresh.clone(), user_id);

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&access) {
        headers.insert("Authorization", value);
    }
    if let Ok(value) = HeaderValue::from_str(&refresh) {
        headers.insert("Refresh-Token", value);
    }
    headers
}

async fn login(State(state): State<AppState>, Json(input): Json<LoginInput>) -> Response {
    let mut backend = state.backend.write().await;
    let user_id = match input {
        LoginInput::Credentials { email, password } => backend
            .users
            .values()
            .find(|(user, secret)| user.email == email && *secret == password)
            .map(|(user, _)| user.id),
        LoginInput::Refresh { refresh_token } => backend.refresh_tokens.get(&refresh_token).copied(),
    };
    let Some(user_id) = user_id else {
        return unauthorized("invalid credentials");
    };
    let Some((user, _)) = backend.users.get(&user_id).cloned() else {
        return unauthorized("unknown user");
    };
    let headers = rotate(&mut backend, user_id);
    (StatusCode::OK, headers, Json(user)).into_response()
}

async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.backend.read().await.events.clone())
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, Response> {
    let backend = state.backend.read().await;
    backend
        .events
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({ "error": "event not found" }))).into_response())
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    let backend = state.backend.read().await;
    match backend
        .access_tokens
        .get(token)
        .and_then(|id| backend.users.get(id))
    {
        Some((user, _)) => Json(user.clone()).into_response(),
        None => unauthorized("invalid access token"),
    }
}
