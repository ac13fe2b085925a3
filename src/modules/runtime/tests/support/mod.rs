//! Small in-memory CRUD API served at `/api/v1/:collection[/:id]`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct Store {
    next_id: u64,
    collections: HashMap<String, BTreeMap<u64, Map<String, Value>>>,
}

type AppState = Arc<Mutex<Store>>;

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

fn matches(record: &Map<String, Value>, key: &str, expected: &str) -> bool {
    match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.lock().unwrap();
    let skip: usize = params.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let limit: usize = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(usize::MAX);

    let records: Vec<Value> = store
        .collections
        .get(&collection)
        .map(|records| {
            records
                .values()
                .filter(|record| {
                    params
                        .iter()
                        .filter(|(key, _)| !["skip", "limit", "offset"].contains(&key.as_str()))
                        .all(|(key, value)| matches(record, key, value))
                })
                .skip(skip)
                .take(limit)
                .cloned()
                .map(Value::Object)
                .collect()
        })
        .unwrap_or_default();

    Json(Value::Array(records))
}

async fn show(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.lock().unwrap();
    store
        .collections
        .get(&collection)
        .and_then(|records| records.get(&id))
        .map(|record| Json(Value::Object(record.clone())))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> (StatusCode, Json<Value>) {
    let mut store = state.lock().unwrap();
    store.next_id += 1;
    let id = store.next_id;

    let mut record = body;
    record.insert("id".to_string(), Value::from(id));
    record.insert("createdAt".to_string(), now());
    record.insert("updatedAt".to_string(), now());

    store
        .collections
        .entry(collection)
        .or_default()
        .insert(id, record.clone());
    (StatusCode::CREATED, Json(Value::Object(record)))
}

async fn update(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = state.lock().unwrap();
    let record = store
        .collections
        .get_mut(&collection)
        .and_then(|records| records.get_mut(&id))
        .ok_or(StatusCode::NOT_FOUND)?;

    for (key, value) in body {
        if key != "id" {
            record.insert(key, value);
        }
    }
    record.insert("updatedAt".to_string(), now());
    Ok(Json(Value::Object(record.clone())))
}

async fn remove(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = state.lock().unwrap();
    store
        .collections
        .get_mut(&collection)
        .and_then(|records| records.remove(&id))
        .map(|record| Json(Value::Object(record)))
        .ok_or(StatusCode::NOT_FOUND)
}

fn router() -> Router {
    Router::new()
        .route("/api/v1/:collection", get(list).post(create))
        .route(
            "/api/v1/:collection/:id",
            get(show).put(update).delete(remove),
        )
        .with_state(AppState::default())
}

/// Serve the API on an ephemeral port and return its address
pub async fn spawn() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}
