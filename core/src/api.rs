//! The single entry point every request goes through.
//!
//! # Design
//! `ApiClient` resolves URLs against the configured base, attaches the bearer
//! token from the `TokenStore`, races the transport against an optional
//! abort signal and maps non-2xx responses to `ApiError`. It neither retries
//! nor caches; those policies live in `queries`. Cloning is cheap and every
//! clone shares the transport and token store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::abort::AbortSignal;
use crate::auth::{AuthClient, LoginRequest, MemoryTokenStore, TokenPair, TokenStore};
use crate::client::{decode, endpoint, ensure_success};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
use crate::resource::{Resource, ResourceApi};
use crate::resources::user::User;
use crate::transport::{Transport, UreqTransport};

/// Status code plus decoded body of a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

/// Per-request overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Target a different origin than the configured one.
    pub base_url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub signal: Option<AbortSignal>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            tokens,
        }
    }

    /// Client over the default `ureq` transport with an in-memory token store.
    pub fn with_ureq(config: ClientConfig) -> Self {
        Self::new(
            config,
            Arc::new(UreqTransport::new()),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn resource<R: Resource>(&self) -> ResourceApi<R> {
        ResourceApi::new(self.clone())
    }

    /// Authorize and execute a fully built request. Returns the raw response
    /// whatever its status.
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    pub async fn send(&self, mut request: HttpRequest, signal: Option<&AbortSignal>) -> Result<HttpResponse, ApiError> {
        if let Some(token) = self.tokens.access_token() {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        if signal.is_some_and(AbortSignal::is_aborted) {
            debug!("request aborted before sending");
            return Err(ApiError::Aborted);
        }

        debug!("sending request");
        let response = match signal {
            Some(signal) => {
                tokio::select! {
                    result = self.transport.execute(request) => result,
                    _ = signal.aborted() => Err(ApiError::Aborted),
                }
            }
            None => self.transport.execute(request).await,
        }?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let base = options.base_url.as_deref().unwrap_or(&self.config.base_url);
        let mut request = HttpRequest::new(method, endpoint(base, path));
        if let Some(body) = body {
            request = request.with_body(body);
        }
        for (name, value) in options.headers {
            request.set_header(&name, value);
        }
        let response = self.send(request, options.signal.as_ref()).await?;
        ensure_success(&response)?;
        Ok(response)
    }

    /// Issue a request and decode the JSON response into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.dispatch(method, path, body, options).await?;
        Ok(ApiResponse {
            status: response.status,
            data: decode(&response)?,
        })
    }

    pub async fn request_text(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<ApiResponse<String>, ApiError> {
        let response = self.dispatch(method, path, body, options).await?;
        Ok(ApiResponse {
            status: response.status,
            data: response.text(),
        })
    }

    pub async fn request_bytes(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<ApiResponse<Vec<u8>>, ApiError> {
        let response = self.dispatch(method, path, body, options).await?;
        Ok(ApiResponse {
            status: response.status,
            data: response.body,
        })
    }

    fn auth(&self) -> AuthClient {
        AuthClient::new(&self.config.base_url)
    }

    /// Exchange credentials for a token pair and keep it in the store.
    #[instrument(skip_all, fields(user = %credentials.user_name))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, ApiError> {
        let auth = self.auth();
        let response = self.send(auth.build_login(credentials)?, None).await?;
        let tokens = auth.parse_tokens(response)?;
        self.tokens.store(tokens.clone());
        debug!("session started");
        Ok(tokens)
    }

    /// Trade the stored refresh token for a new pair.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self) -> Result<TokenPair, ApiError> {
        let refresh_token = self.tokens.refresh_token().ok_or(ApiError::Unauthenticated)?;
        let auth = self.auth();
        let response = self.send(auth.build_refresh(&refresh_token)?, None).await?;
        let tokens = auth.parse_tokens(response)?;
        self.tokens.store(tokens.clone());
        debug!("session refreshed");
        Ok(tokens)
    }

    /// Tell the backend the session is over, then forget the tokens whatever it answered.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let auth = self.auth();
        let outcome = match self.send(auth.build_logout(), None).await {
            Ok(response) => auth.parse_logout(response),
            Err(e) => Err(e),
        };
        self.tokens.clear();
        outcome
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let auth = self.auth();
        let response = self.send(auth.build_current_user(), None).await?;
        auth.parse_current_user(response)
    }
}
