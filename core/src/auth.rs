//! Session tokens and the auth endpoints that mint them.
//!
//! `TokenStore` is the seam to whatever owns the session (cookies, keychain,
//! memory); `ApiClient` only reads the access token from it and writes back
//! pairs returned by login and refresh. `AuthClient` follows the same
//! build/parse split as `ResourceClient`.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::client::{decode, endpoint, ensure_success, json_request};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resources::user::User;
use crate::types::Envelope;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Credentials for `auth/login`. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Source of the current session tokens.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn store(&self, tokens: TokenPair);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|t| t.as_ref().map(|t| t.access_token.clone()))
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|t| t.as_ref().map(|t| t.refresh_token.clone()))
    }

    fn store(&self, tokens: TokenPair) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = Some(tokens);
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = None;
        }
    }
}

/// Request builder and response parser for the `auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        credentials.validate()?;
        json_request(HttpMethod::Post, endpoint(&self.base_url, "auth/login"), credentials)
    }

    pub fn build_refresh(&self, refresh_token: &str) -> Result<HttpRequest, ApiError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        json_request(HttpMethod::Post, endpoint(&self.base_url, "auth/refresh-token"), &body)
    }

    pub fn build_logout(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, endpoint(&self.base_url, "auth/logout"))
    }

    pub fn build_current_user(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, endpoint(&self.base_url, "auth/me"))
    }

    pub fn parse_tokens(&self, response: HttpResponse) -> Result<TokenPair, ApiError> {
        ensure_success(&response)?;
        let envelope: Envelope<TokenPair> = decode(&response)?;
        Ok(envelope.data)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        ensure_success(&response)
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        ensure_success(&response)?;
        let envelope: Envelope<User> = decode(&response)?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        AuthClient::new("http://localhost:5000/api/")
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().is_none());
        store.store(TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        });
        assert_eq!(store.access_token().as_deref(), Some("a"));
        assert_eq!(store.refresh_token().as_deref(), Some("r"));
        store.clear();
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn build_login_posts_credentials() {
        let req = client()
            .build_login(&LoginRequest {
                user_name: "admin".to_string(),
                password: "password".to_string(),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5000/api/auth/login");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["userName"], "admin");
    }

    #[test]
    fn build_login_rejects_short_user_name() {
        let err = client()
            .build_login(&LoginRequest {
                user_name: "ab".to_string(),
                password: "x".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn login_request_is_strict() {
        let parsed = serde_json::from_str::<LoginRequest>(r#"{"userName":"admin","password":"p","remember":true}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_tokens_reads_envelope() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: br#"{"data":{"accessToken":"a1","refreshToken":"r1"},"message":"ok"}"#.to_vec(),
        };
        let tokens = client().parse_tokens(response).unwrap();
        assert_eq!(tokens.access_token, "a1");
    }

    #[test]
    fn parse_tokens_surfaces_401() {
        let response = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: br#"{"message":"Invalid credentials","succeeded":false,"code":401}"#.to_vec(),
        };
        let err = client().parse_tokens(response).unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "Invalid credentials");
    }
}
