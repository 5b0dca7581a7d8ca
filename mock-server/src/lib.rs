//! In-memory stand-in for the LinguaTech backend.
//!
//! Serves `/api/{resource}/list|all|create|update/{id}|delete/{id}|{id}` for
//! every resource, the `/api/auth/*` session endpoints and the few
//! resource-specific routes (avatar upload, menu assignment, menus by role).
//! Everything except login and refresh requires a bearer token.

pub mod auth;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::auth::SessionStore;
use crate::store::{Collection, Db, RESOURCES};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub sessions: SessionStore,
    pub admin_id: Uuid,
}

impl AppState {
    pub fn new() -> Self {
        let collections: HashMap<&'static str, Collection> = RESOURCES
            .iter()
            .map(|name| (*name, Collection::default()))
            .collect();
        Self {
            db: Arc::new(RwLock::new(collections)),
            sessions: SessionStore::default(),
            admin_id: Uuid::new_v4(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Error answered as `{ message, succeeded: false, code }`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "message": self.message,
            "succeeded": false,
            "code": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiFailure> {
    serde_json::from_slice(body).map_err(|e| ApiFailure::bad_request(format!("Invalid request body: {e}")))
}

fn envelope(data: Value, message: &str) -> Json<Value> {
    Json(json!({"data": data, "message": message, "succeeded": true}))
}

/// Handler state for one resource's routes.
#[derive(Clone)]
struct Table {
    name: &'static str,
    db: Db,
}

impl Table {
    fn uuid_ids(&self) -> bool {
        self.name == "users"
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    let mut protected: Router<AppState> = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));
    for name in RESOURCES {
        protected = protected.nest(&format!("/{name}"), resource_routes(name, &state));
    }
    let protected = protected.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_bearer,
    ));

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh))
        .merge(protected);

    Router::new().nest("/api", api).with_state(state)
}

fn resource_routes(name: &'static str, state: &AppState) -> Router<AppState> {
    let mut routes = Router::new()
        .route("/list", get(list_rows))
        .route("/all", get(all_rows))
        .route("/create", post(create_row))
        .route("/update/{id}", post(update_row))
        .route("/delete/{id}", post(delete_row))
        .route("/{id}", get(get_row));
    routes = match name {
        "users" => routes.route("/avatar/{id}", post(upload_avatar)),
        "roles" => routes.route("/assign-menus/{id}", post(assign_menus)),
        "menus" => routes.route("/by-role/{id}", get(menus_by_role)),
        _ => routes,
    };
    routes.with_state(Table {
        name,
        db: state.db.clone(),
    })
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn as_object(value: Value) -> Result<Map<String, Value>, ApiFailure> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiFailure::bad_request("Request body must be a JSON object")),
    }
}

/// Reject blank display fields the backend requires.
fn check_required(fields: &Map<String, Value>) -> Result<(), ApiFailure> {
    for key in ["name", "title", "userName"] {
        if let Some(Value::String(text)) = fields.get(key) {
            if text.trim().is_empty() {
                return Err(ApiFailure::bad_request(format!("{key} is required")));
            }
        }
    }
    Ok(())
}

/// Users: strip the password, enforce unique emails.
fn prepare_user(
    users: &Collection,
    fields: &mut Map<String, Value>,
    own_id: Option<&str>,
) -> Result<(), ApiFailure> {
    fields.remove("password");
    if let Some(email) = fields.get("email").and_then(Value::as_str) {
        let taken = users.all().iter().any(|row| {
            row.get("email").and_then(Value::as_str) == Some(email)
                && own_id.is_none_or(|id| row.get("id").and_then(Value::as_str) != Some(id))
        });
        if taken {
            return Err(ApiFailure::conflict(format!("Email {email} is already registered")));
        }
    }
    Ok(())
}

async fn list_rows(
    State(table): State<Table>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiFailure> {
    let db = table.db.read().await;
    let rows = db.get(table.name).ok_or_else(|| ApiFailure::not_found(table.name))?;
    rows.page(&query).map(Json).map_err(ApiFailure::bad_request)
}

async fn all_rows(State(table): State<Table>) -> Result<Json<Value>, ApiFailure> {
    let db = table.db.read().await;
    let rows = db.get(table.name).ok_or_else(|| ApiFailure::not_found(table.name))?;
    Ok(envelope(Value::Array(rows.all().to_vec()), ""))
}

async fn get_row(State(table): State<Table>, Path(id): Path<String>) -> Result<Json<Value>, ApiFailure> {
    let db = table.db.read().await;
    let row = db
        .get(table.name)
        .and_then(|rows| rows.find(&id))
        .ok_or_else(|| ApiFailure::not_found(&format!("{} {id}", table.name)))?;
    Ok(envelope(row.clone(), ""))
}

async fn create_row(State(table): State<Table>, body: Bytes) -> Result<(StatusCode, Json<Value>), ApiFailure> {
    let mut fields = as_object(parse_body(&body)?)?;
    check_required(&fields)?;

    let mut db = table.db.write().await;
    let rows = db
        .get_mut(table.name)
        .ok_or_else(|| ApiFailure::not_found(table.name))?;
    if table.uuid_ids() {
        prepare_user(rows, &mut fields, None)?;
        fields.entry("isActive").or_insert(Value::Bool(true));
        fields.entry("roles").or_insert_with(|| json!([]));
    }
    let row = rows.insert(fields, table.uuid_ids());
    debug!(resource = table.name, id = %row["id"], "created");
    Ok((StatusCode::CREATED, envelope(row, "Created successfully")))
}

async fn update_row(
    State(table): State<Table>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let mut fields = as_object(parse_body(&body)?)?;
    check_required(&fields)?;

    let mut db = table.db.write().await;
    let rows = db
        .get_mut(table.name)
        .ok_or_else(|| ApiFailure::not_found(table.name))?;
    if table.uuid_ids() {
        prepare_user(rows, &mut fields, Some(&id))?;
    }
    let row = rows
        .merge(&id, fields)
        .ok_or_else(|| ApiFailure::not_found(&format!("{} {id}", table.name)))?;
    Ok(envelope(row, "Updated successfully"))
}

async fn delete_row(State(table): State<Table>, Path(id): Path<String>) -> Result<StatusCode, ApiFailure> {
    let mut db = table.db.write().await;
    let removed = db
        .get_mut(table.name)
        .is_some_and(|rows| rows.remove(&id));
    if !removed {
        return Err(ApiFailure::not_found(&format!("{} {id}", table.name)));
    }
    debug!(resource = table.name, %id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_avatar(
    State(table): State<Table>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiFailure> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::bad_request(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .ok_or_else(|| ApiFailure::bad_request("Filename not provided"))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiFailure::bad_request(format!("Read error: {e}")))?;
        upload = Some((file_name, data));
    }
    let (file_name, data) = upload.ok_or_else(|| ApiFailure::bad_request("No file provided"))?;
    if data.is_empty() {
        return Err(ApiFailure::bad_request("File is empty"));
    }

    let mut db = table.db.write().await;
    let mut fields = Map::new();
    fields.insert(
        "avatarUrl".to_string(),
        json!(format!("/uploads/avatars/{id}/{file_name}")),
    );
    let row = db
        .get_mut(table.name)
        .and_then(|rows| rows.merge(&id, fields))
        .ok_or_else(|| ApiFailure::not_found(&format!("user {id}")))?;
    debug!(%id, bytes = data.len(), "avatar stored");
    Ok(envelope(row, "Avatar uploaded"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuAssignment {
    menu_ids: Vec<i64>,
}

async fn assign_menus(
    State(table): State<Table>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let input: MenuAssignment = parse_body(&body)?;
    let mut db = table.db.write().await;
    let mut fields = Map::new();
    fields.insert("menuIds".to_string(), json!(input.menu_ids));
    let row = db
        .get_mut(table.name)
        .and_then(|rows| rows.merge(&id, fields))
        .ok_or_else(|| ApiFailure::not_found(&format!("role {id}")))?;
    Ok(envelope(row, "Menus assigned"))
}

async fn menus_by_role(State(table): State<Table>, Path(id): Path<String>) -> Result<Json<Value>, ApiFailure> {
    let db = table.db.read().await;
    let role = db
        .get("roles")
        .and_then(|roles| roles.find(&id))
        .ok_or_else(|| ApiFailure::not_found(&format!("role {id}")))?;
    let menu_ids: Vec<i64> = role
        .get("menuIds")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let menus: Vec<Value> = db
        .get(table.name)
        .map(|rows| {
            rows.all()
                .iter()
                .filter(|menu| {
                    menu.get("id")
                        .and_then(Value::as_i64)
                        .is_some_and(|menu_id| menu_ids.contains(&menu_id))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(envelope(Value::Array(menus), ""))
}
