//! Bearer-token sessions for the mock API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{ApiFailure, AppState};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";

#[derive(Debug, Default)]
pub struct Sessions {
    access: HashMap<String, String>,
    refresh: HashMap<String, String>,
}

pub type SessionStore = Arc<RwLock<Sessions>>;

impl Sessions {
    /// Issue a fresh token pair for `user`.
    pub fn issue(&mut self, user: &str) -> Value {
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        self.access.insert(access_token.clone(), user.to_string());
        self.refresh.insert(refresh_token.clone(), user.to_string());
        json!({"accessToken": access_token, "refreshToken": refresh_token})
    }

    pub fn user_for(&self, access_token: &str) -> Option<&str> {
        self.access.get(access_token).map(String::as_str)
    }

    /// Refresh tokens are single use.
    pub fn rotate(&mut self, refresh_token: &str) -> Option<Value> {
        let user = self.refresh.remove(refresh_token)?;
        Some(self.issue(&user))
    }

    pub fn revoke(&mut self, access_token: &str) {
        self.access.remove(access_token);
    }
}

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let token = bearer(&request).ok_or_else(|| ApiFailure::unauthorized("Missing bearer token"))?;
    if state.sessions.read().await.user_for(token).is_none() {
        return Err(ApiFailure::unauthorized("Invalid or expired token"));
    }
    Ok(next.run(request).await)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: String,
}

pub async fn login(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let credentials: Credentials = crate::parse_body(&body)?;
    if credentials.user_name != ADMIN_USER || credentials.password != ADMIN_PASSWORD {
        return Err(ApiFailure::unauthorized("Invalid username or password"));
    }
    let tokens = state.sessions.write().await.issue(&credentials.user_name);
    debug!(user = %credentials.user_name, "login");
    Ok(Json(json!({"data": tokens, "message": "Login successful", "succeeded": true})))
}

pub async fn refresh(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let input: RefreshBody = crate::parse_body(&body)?;
    let tokens = state
        .sessions
        .write()
        .await
        .rotate(&input.refresh_token)
        .ok_or_else(|| ApiFailure::unauthorized("Invalid refresh token"))?;
    Ok(Json(json!({"data": tokens, "message": "Token refreshed", "succeeded": true})))
}

pub async fn logout(State(state): State<AppState>, request: Request) -> Json<Value> {
    if let Some(token) = bearer(&request) {
        state.sessions.write().await.revoke(token);
    }
    Json(json!({"data": null, "message": "Logged out", "succeeded": true}))
}

pub async fn me(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": {
            "id": state.admin_id,
            "userName": ADMIN_USER,
            "email": "admin@linguatech.local",
            "fullName": "Administrator",
            "isActive": true,
            "roles": ["Admin"],
        },
        "message": "",
        "succeeded": true,
    }))
}
