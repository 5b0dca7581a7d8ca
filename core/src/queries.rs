//! Cache-keyed reads and cache-invalidating writes.
//!
//! # Design
//! `QueryClient` couples an `ApiClient` with a shared `QueryCache`. Reads go
//! through [`QueryCache::fetch`], so identical concurrent reads share one
//! request, and report their outcome as a [`QueryState`]. Writes never touch
//! cached values directly: on success they invalidate the affected keys and
//! the next read refetches.
//!
//! Keys per resource:
//! - `[name, "list", "k=v", ...]`, built from the same stripped query pairs
//!   as the URL, so empty filters never split the cache
//! - `[name, "all"]`
//! - `[name, "detail", id]`
//!
//! Retries follow `ClientConfig::retry` and apply to transport failures
//! only; HTTP error responses are returned as-is.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::abort::AbortSignal;
use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::error::ApiError;
use crate::params::query_pairs;
use crate::resource::{Resource, ResourceApi};
use crate::types::{Envelope, ListParams, Paginated};

/// Outcome of a read.
#[derive(Debug)]
pub enum QueryState<T> {
    /// The read was disabled or nothing has been fetched.
    Idle,
    /// A fetch for this key is in flight and nothing is cached yet.
    Loading,
    Success(Arc<T>),
    Error(ApiError),
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Success(data) => QueryState::Success(Arc::clone(data)),
            QueryState::Error(e) => QueryState::Error(e.clone()),
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, QueryState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryState::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// `Ok(None)` for `Idle`/`Loading`.
    pub fn into_result(self) -> Result<Option<Arc<T>>, ApiError> {
        match self {
            QueryState::Success(data) => Ok(Some(data)),
            QueryState::Error(e) => Err(e),
            QueryState::Idle | QueryState::Loading => Ok(None),
        }
    }
}

impl<T> From<Result<Arc<T>, ApiError>> for QueryState<T> {
    fn from(result: Result<Arc<T>, ApiError>) -> Self {
        match result {
            Ok(data) => QueryState::Success(data),
            Err(e) => QueryState::Error(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// When false the read is skipped, e.g. until a dependent id is known.
    pub enabled: bool,
    pub signal: Option<AbortSignal>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            signal: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

async fn retrying<T, F, Fut>(retries: u32, operation: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(e) if e.is_transport() && attempt < retries => {
                attempt += 1;
                warn!(attempt, retries, error = %e, "retrying after transport failure");
            }
            outcome => return outcome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryClient {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl QueryClient {
    /// Client with its own cache, configured from the api client's settings.
    pub fn new(api: ApiClient) -> Self {
        let cache = Arc::new(QueryCache::new(api.config().cache.stale_time()));
        Self { api, cache }
    }

    /// Client over an existing cache, e.g. one shared with other clients.
    pub fn with_cache(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn resource<R: Resource>(&self) -> ResourceQueries<R> {
        ResourceQueries {
            client: self.clone(),
            api: self.api.resource::<R>(),
        }
    }

    /// Run a keyed read through the cache with the read retry policy.
    ///
    /// A caller joining another caller's fetch still honours its own
    /// `options.signal`.
    pub async fn query<T, F, Fut>(&self, key: QueryKey, options: &QueryOptions, fetch: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !options.enabled {
            return QueryState::Idle;
        }
        let retries = self.api.config().retry.reads;
        let fetch = &fetch;
        self.cache
            .fetch_with_signal(&key, options.signal.as_ref(), move || retrying(retries, fetch))
            .await
            .into()
    }

    /// Cached state for `key` without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        if let Some(data) = self.cache.get::<T>(key) {
            return QueryState::Success(data);
        }
        if self.cache.is_fetching(key) {
            return QueryState::Loading;
        }
        QueryState::Idle
    }

    /// Run a write with the mutation retry policy, then invalidate `keys`.
    /// Nothing is invalidated when the write fails.
    pub async fn mutate<T, F, Fut>(&self, keys: &[QueryKey], mutation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let outcome = retrying(self.api.config().retry.mutations, mutation).await?;
        for key in keys {
            self.cache.invalidate(key);
        }
        Ok(outcome)
    }
}

/// Reads and writes for one resource.
pub struct ResourceQueries<R> {
    client: QueryClient,
    api: ResourceApi<R>,
}

impl<R: Resource> ResourceQueries<R> {
    /// `[name]`, the prefix of every key of this resource.
    pub fn root_key() -> QueryKey {
        QueryKey::new(R::NAME)
    }

    pub fn lists_key() -> QueryKey {
        Self::root_key().with("list")
    }

    pub fn list_key(params: &ListParams<R::Filter>) -> Result<QueryKey, ApiError> {
        let key = query_pairs(params)?
            .into_iter()
            .fold(Self::lists_key(), |key, (name, value)| key.with(format!("{name}={value}")));
        Ok(key)
    }

    pub fn all_key() -> QueryKey {
        Self::root_key().with("all")
    }

    pub fn detail_key(id: &R::Id) -> QueryKey {
        Self::root_key().with("detail").with(id)
    }

    /// Keys a mutation of this resource makes stale.
    pub(crate) fn collection_keys() -> Vec<QueryKey> {
        let mut keys = vec![Self::lists_key(), Self::all_key()];
        keys.extend(R::RELATED.iter().map(|name| QueryKey::new(name)));
        keys
    }

    fn api_for(&self, options: &QueryOptions) -> ResourceApi<R> {
        self.api.clone().with_signal(options.signal.clone())
    }

    pub fn api(&self) -> &ResourceApi<R> {
        &self.api
    }

    pub(crate) fn client(&self) -> &QueryClient {
        &self.client
    }

    pub async fn list(&self, params: &ListParams<R::Filter>, options: QueryOptions) -> QueryState<Paginated<R::Entity>> {
        if let Err(e) = params.validate() {
            return QueryState::Error(e.into());
        }
        let key = match Self::list_key(params) {
            Ok(key) => key,
            Err(e) => return QueryState::Error(e),
        };
        let api = &self.api_for(&options);
        self.client.query(key, &options, move || api.list(params)).await
    }

    pub async fn get_all(&self, options: QueryOptions) -> QueryState<Vec<R::Entity>> {
        let api = &self.api_for(&options);
        self.client
            .query(Self::all_key(), &options, move || api.get_all())
            .await
    }

    pub async fn get_by_id(&self, id: &R::Id, options: QueryOptions) -> QueryState<R::Entity> {
        let api = &self.api_for(&options);
        self.client
            .query(Self::detail_key(id), &options, move || api.get_by_id(id))
            .await
    }

    pub fn peek_list(&self, params: &ListParams<R::Filter>) -> QueryState<Paginated<R::Entity>> {
        match Self::list_key(params) {
            Ok(key) => self.client.peek(&key),
            Err(e) => QueryState::Error(e),
        }
    }

    pub fn peek_by_id(&self, id: &R::Id) -> QueryState<R::Entity> {
        self.client.peek(&Self::detail_key(id))
    }

    pub async fn create(&self, input: &R::Create) -> Result<Envelope<R::Entity>, ApiError> {
        let api = &self.api;
        self.client
            .mutate(&Self::collection_keys(), move || api.create(input))
            .await
    }

    pub async fn update(&self, id: &R::Id, input: &R::Update) -> Result<Envelope<R::Entity>, ApiError> {
        let mut keys = Self::collection_keys();
        keys.push(Self::detail_key(id));
        let api = &self.api;
        self.client.mutate(&keys, move || api.update(id, input)).await
    }

    pub async fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        let mut keys = Self::collection_keys();
        keys.push(Self::detail_key(id));
        let api = &self.api;
        self.client.mutate(&keys, move || api.delete(id)).await
    }
}
