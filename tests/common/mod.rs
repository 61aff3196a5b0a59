//! In-process stub of the PartyFinder backend.
//!
//! Serves the subset of the REST API the client uses from in-memory
//! state, records every request line, and counts requests that arrived
//! without an `x-request-id` header.

#![allow(dead_code, clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value, json};

use partyfinder::app_state::AppState;
use partyfinder::config::ClientConfig;
use partyfinder::domain::{Event, LoginCredentials};

/// Venue used by seeded events.
pub const EVENT_LAT: f64 = 42.0267;
/// Venue used by seeded events.
pub const EVENT_LNG: f64 = -93.6465;
/// Password of every seeded account.
pub const PASSWORD: &str = "secret";

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub token: String,
    pub user_id: String,
}

/// Mutable backend state.
#[derive(Debug, Default)]
pub struct StubData {
    pub accounts: Vec<Account>,
    pub events: Vec<Value>,
    /// (user id, event id)
    pub checkins: Vec<(String, String)>,
    pub media: Vec<Value>,
    /// (file name, content type, byte length)
    pub uploads: Vec<(String, String, usize)>,
    /// (user id, friend user id)
    pub friendships: Vec<(String, String)>,
    pub requests: Vec<String>,
    pub untagged_requests: usize,
    pub fail_attended: bool,
    /// Status and message returned by every `POST /api/checkins`.
    pub check_in_rejection: Option<(u16, String)>,
    /// Pause after reading the live list and before answering.
    pub events_delay_ms: u64,
    pub next_id: u64,
}

/// Shared stub handle.
#[derive(Debug, Default)]
pub struct Stub {
    data: Mutex<StubData>,
}

impl Stub {
    fn new() -> Self {
        let accounts = ["host", "guest", "stranger"]
            .into_iter()
            .map(|name| Account {
                email: format!("{name}@example.com"),
                token: format!("t-{name}"),
                user_id: name.to_string(),
            })
            .collect();
        Self {
            data: Mutex::new(StubData {
                accounts,
                ..StubData::default()
            }),
        }
    }

    /// Runs `f` with exclusive access to the state.
    pub fn with<R>(&self, f: impl FnOnce(&mut StubData) -> R) -> R {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }

    /// Number of recorded requests equal to `line` (e.g. `"POST /api/checkins"`).
    pub fn count(&self, line: &str) -> usize {
        self.with(|d| d.requests.iter().filter(|r| *r == line).count())
    }

    /// Adds an event.
    pub fn seed_event(&self, event: Value) {
        self.with(|d| d.events.push(event));
    }

    /// Records a check-in server-side.
    pub fn seed_check_in(&self, user: &str, event: &str) {
        self.with(|d| d.checkins.push((user.to_string(), event.to_string())));
    }

    /// Marks an event archived server-side.
    pub fn archive(&self, id: &str) {
        self.with(|d| {
            if let Some(event) = find_mut(&mut d.events, id) {
                set(event, "is_archived", json!(true));
                set(event, "archived_at", json!(Utc::now()));
            }
        });
    }

    /// Decodes the stored event `id`.
    pub fn event(&self, id: &str) -> Event {
        let value = self.with(|d| d.events.iter().find(|e| id_of(e) == id).cloned());
        let Some(value) = value else {
            panic!("no stub event {id}");
        };
        let Ok(event) = serde_json::from_value::<Event>(value) else {
            panic!("stub event {id} does not decode");
        };
        event
    }
}

/// A live, active event at the seeded venue that started an hour ago.
pub fn event_json(id: &str, creator: &str) -> Value {
    event_at(id, creator, Utc::now() - Duration::hours(1))
}

/// A live, active event at the seeded venue.
pub fn event_at(id: &str, creator: &str, start: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "title": format!("Party {id}"),
        "description": null,
        "host_type": "house",
        "location_lat": EVENT_LAT,
        "location_lng": EVENT_LNG,
        "start_time": start,
        "end_time": null,
        "tags": [],
        "is_byob": false,
        "is_active": true,
        "is_archived": false,
        "visibility": "everyone",
        "created_by": creator,
        "checkin_count": 0,
    })
}

/// Starts the stub on an ephemeral port and returns its base URL.
pub async fn spawn_stub() -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::new());
    let app = router(Arc::clone(&stub));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), stub)
}

/// A fresh client session against `base_url` with an in-memory store.
pub async fn client(base_url: &str) -> AppState {
    let config = ClientConfig::default()
        .with_api_base_url(base_url)
        .with_local_store_url("sqlite::memory:");
    let Ok(state) = AppState::build(config).await else {
        panic!("client state build failed");
    };
    state
}

/// A client session signed in as `name` (`host`, `guest`, or `stranger`).
pub async fn signed_in(base_url: &str, name: &str) -> AppState {
    let state = client(base_url).await;
    let credentials = LoginCredentials {
        email: format!("{name}@example.com"),
        password: PASSWORD.to_string(),
    };
    let Ok(_) = state.session.login(&credentials).await else {
        panic!("login as {name} failed");
    };
    state
}

fn router(stub: Arc<Stub>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/archived", get(list_archived))
        .route("/api/events/{id}", put(update_event).delete(delete_event))
        .route("/api/events/{id}/archive", post(archive_event))
        .route("/api/events/{id}/media", get(list_media).post(upload_media))
        .route("/api/events/{id}/media/{media_id}", delete(delete_media))
        .route("/api/checkins", get(list_check_ins).post(check_in))
        .route("/api/friends", get(list_friends))
        .layer(middleware::from_fn_with_state(Arc::clone(&stub), track))
        .with_state(stub)
}

async fn track(State(stub): State<Arc<Stub>>, req: Request, next: Next) -> Response {
    let tagged = req.headers().contains_key("x-request-id");
    let line = format!("{} {}", req.method(), req.uri().path());
    stub.with(|d| {
        d.requests.push(line);
        if !tagged {
            d.untagged_requests += 1;
        }
    });
    next.run(req).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn id_of(value: &Value) -> &str {
    value.get("id").and_then(Value::as_str).unwrap_or_default()
}

fn find_mut<'a>(events: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    events.iter_mut().find(|e| id_of(e) == id)
}

fn set(value: &mut Value, key: &str, new: Value) {
    if let Some(object) = value.as_object_mut() {
        object.insert(key.to_string(), new);
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn caller(stub: &Stub, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .to_string();
    stub.with(|d| {
        d.accounts
            .iter()
            .find(|a| a.token == token)
            .map(|a| a.user_id.clone())
    })
}

fn auth_body(account: &Account) -> Value {
    json!({
        "token": account.token,
        "user": {
            "user_id": account.user_id,
            "email": account.email,
            "display_name": account.user_id,
            "friend_code": null,
            "reputation_score": 0,
            "created_at": Utc::now(),
        }
    })
}

async fn login(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    let email = str_field(&body, "email");
    if email == "html@example.com" {
        return (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<html>upstream down</html>",
        )
            .into_response();
    }
    let account = stub.with(|d| d.accounts.iter().find(|a| a.email == email).cloned());
    match account {
        Some(account) if str_field(&body, "password") == PASSWORD => {
            Json(auth_body(&account)).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn register(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    let email = str_field(&body, "email").to_string();
    let account = stub.with(|d| {
        if d.accounts.iter().any(|a| a.email == email) {
            return None;
        }
        d.next_id += 1;
        let account = Account {
            email,
            token: format!("t-new-{}", d.next_id),
            user_id: format!("new-{}", d.next_id),
        };
        d.accounts.push(account.clone());
        Some(account)
    });
    match account {
        Some(account) => (StatusCode::CREATED, Json(auth_body(&account))).into_response(),
        None => error(StatusCode::BAD_REQUEST, "Email already registered"),
    }
}

async fn list_events(State(stub): State<Arc<Stub>>) -> Response {
    let (live, delay_ms) = stub.with(|d| {
        let live: Vec<Value> = d
            .events
            .iter()
            .filter(|e| !e.get("is_archived").and_then(Value::as_bool).unwrap_or(false))
            .cloned()
            .collect();
        (live, d.events_delay_ms)
    });
    if delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }
    Json(live).into_response()
}

async fn list_archived(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let role = query.get("role").cloned().unwrap_or_default();
    stub.with(|d| {
        if role == "attended" && d.fail_attended {
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
        }
        let archived = d
            .events
            .iter()
            .filter(|e| e.get("is_archived").and_then(Value::as_bool).unwrap_or(false))
            .filter(|e| match role.as_str() {
                "host" => str_field(e, "created_by") == user,
                _ => d
                    .checkins
                    .iter()
                    .any(|(u, ev)| *u == user && ev == id_of(e)),
            })
            .cloned()
            .collect::<Vec<Value>>();
        Json(archived).into_response()
    })
}

async fn create_event(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let created = stub.with(|d| {
        d.next_id += 1;
        set(&mut body, "id", json!(format!("evt-{}", d.next_id)));
        set(&mut body, "created_by", json!(user));
        set(&mut body, "is_active", json!(true));
        set(&mut body, "is_archived", json!(false));
        set(&mut body, "checkin_count", json!(0));
        d.events.push(body.clone());
        body
    });
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_event(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    stub.with(|d| {
        let Some(event) = find_mut(&mut d.events, &id) else {
            return error(StatusCode::NOT_FOUND, "Event not found");
        };
        if str_field(event, "created_by") != user {
            return error(StatusCode::FORBIDDEN, "Not authorized");
        }
        for (key, value) in body {
            set(event, &key, value);
        }
        Json(event.clone()).into_response()
    })
}

async fn delete_event(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    stub.with(|d| {
        let Some(pos) = d.events.iter().position(|e| id_of(e) == id) else {
            return error(StatusCode::NOT_FOUND, "Event not found");
        };
        if d.events.get(pos).map(|e| str_field(e, "created_by")) != Some(user.as_str()) {
            return error(StatusCode::FORBIDDEN, "Not authorized");
        }
        d.events.remove(pos);
        StatusCode::NO_CONTENT.into_response()
    })
}

async fn archive_event(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let owner = stub.with(|d| {
        d.events
            .iter()
            .find(|e| id_of(e) == id)
            .map(|e| str_field(e, "created_by").to_string())
    });
    match owner {
        None => error(StatusCode::NOT_FOUND, "Event not found"),
        Some(owner) if owner != user => error(StatusCode::FORBIDDEN, "Not authorized"),
        Some(_) => {
            stub.archive(&id);
            Json(json!({ "ok": true })).into_response()
        }
    }
}

async fn check_in(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let event_id = str_field(&body, "event_id").to_string();
    stub.with(|d| {
        if let Some((status, message)) = &d.check_in_rejection {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST);
            return error(status, message);
        }
        if d.checkins.iter().any(|(u, e)| *u == user && *e == event_id) {
            return error(StatusCode::CONFLICT, "You have already checked in to this event");
        }
        let Some(event) = find_mut(&mut d.events, &event_id) else {
            return error(StatusCode::NOT_FOUND, "Event not found");
        };
        let count = event
            .get("checkin_count")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        set(event, "checkin_count", json!(count + 1));
        d.checkins.push((user.clone(), event_id.clone()));
        (
            StatusCode::CREATED,
            Json(json!({ "event_id": event_id, "user_id": user, "checked_in_at": Utc::now() })),
        )
            .into_response()
    })
}

async fn list_check_ins(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let records: Vec<Value> = stub.with(|d| {
        d.checkins
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(u, e)| json!({ "event_id": e, "user_id": u, "checked_in_at": Utc::now() }))
            .collect()
    });
    Json(records).into_response()
}

async fn list_media(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> Response {
    let items: Vec<Value> = stub.with(|d| {
        d.media
            .iter()
            .filter(|m| str_field(m, "event_id") == id)
            .cloned()
            .collect()
    });
    Json(items).into_response()
}

async fn upload_media(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("media") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            return error(StatusCode::BAD_REQUEST, "Unreadable upload");
        };
        let item = stub.with(|d| {
            d.next_id += 1;
            let media_type = if content_type.starts_with("video/") {
                "video"
            } else {
                "image"
            };
            let item = json!({
                "media_id": format!("m-{}", d.next_id),
                "event_id": id,
                "user_id": user,
                "media_type": media_type,
                "media_url": format!("/uploads/{file_name}"),
                "caption": null,
                "created_at": Utc::now(),
            });
            d.uploads.push((file_name, content_type, bytes.len()));
            d.media.push(item.clone());
            item
        });
        return (StatusCode::CREATED, Json(item)).into_response();
    }
    error(StatusCode::BAD_REQUEST, "No file uploaded")
}

async fn delete_media(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path((id, media_id)): Path<(String, String)>,
) -> Response {
    if caller(&stub, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    stub.with(|d| {
        d.media
            .retain(|m| !(str_field(m, "event_id") == id && str_field(m, "media_id") == media_id));
    });
    StatusCode::NO_CONTENT.into_response()
}

async fn list_friends(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    let Some(user) = caller(&stub, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let friends: Vec<Value> = stub.with(|d| {
        d.friendships
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, friend)| {
                json!({
                    "user_id": friend,
                    "email": format!("{friend}@example.com"),
                    "display_name": friend,
                    "reputation_score": 0,
                    "friendship_id": format!("f-{user}-{friend}"),
                    "created_at": Utc::now(),
                })
            })
            .collect()
    });
    Json(friends).into_response()
}
