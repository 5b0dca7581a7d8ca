//! The per-resource contract and the executor that runs it.
//!
//! A `Resource` is a type-level description of one backend entity: its path
//! segment, identifier, entity shape and DTOs. `ResourceApi<R>` pairs a
//! `ResourceClient<R>` with an `ApiClient` and exposes the six standard
//! operations. Errors pass through untranslated.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;
use validator::Validate;

use crate::abort::AbortSignal;
use crate::api::ApiClient;
use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Envelope, ListParams, Paginated};

pub trait Resource: Send + Sync + 'static {
    /// Path segment and cache-key root, e.g. `"users"`.
    const NAME: &'static str;

    /// Other resources whose cached reads embed this one; their entries are
    /// invalidated by this resource's mutations too.
    const RELATED: &'static [&'static str] = &[];

    type Id: fmt::Display + Clone + Send + Sync + 'static;
    type Entity: DeserializeOwned + Send + Sync + 'static;
    type Create: Serialize + Validate + Send + Sync;
    type Update: Serialize + Validate + Send + Sync;
    type Filter: Serialize + Default + Send + Sync;
}

pub struct ResourceApi<R> {
    api: ApiClient,
    client: ResourceClient<R>,
    signal: Option<AbortSignal>,
}

impl<R> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            client: self.client.clone(),
            signal: self.signal.clone(),
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    pub fn new(api: ApiClient) -> Self {
        let client = ResourceClient::new(api.base_url());
        Self {
            api,
            client,
            signal: None,
        }
    }

    /// Make every request issued through this handle abortable.
    pub fn with_signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn client(&self) -> &ResourceClient<R> {
        &self.client
    }

    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.api.send(request, self.signal.as_ref()).await
    }

    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn list(&self, params: &ListParams<R::Filter>) -> Result<Paginated<R::Entity>, ApiError> {
        let request = self.client.build_list(params)?;
        let response = self.execute(request).await?;
        self.client.parse_list(response)
    }

    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn get_all(&self) -> Result<Vec<R::Entity>, ApiError> {
        let response = self.execute(self.client.build_get_all()).await?;
        self.client.parse_get_all(response)
    }

    #[instrument(skip_all, fields(resource = R::NAME, id = %id))]
    pub async fn get_by_id(&self, id: &R::Id) -> Result<R::Entity, ApiError> {
        let response = self.execute(self.client.build_get_by_id(id)).await?;
        self.client.parse_get_by_id(response)
    }

    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn create(&self, input: &R::Create) -> Result<Envelope<R::Entity>, ApiError> {
        let request = self.client.build_create(input)?;
        let response = self.execute(request).await?;
        self.client.parse_create(response)
    }

    #[instrument(skip_all, fields(resource = R::NAME, id = %id))]
    pub async fn update(&self, id: &R::Id, input: &R::Update) -> Result<Envelope<R::Entity>, ApiError> {
        let request = self.client.build_update(id, input)?;
        let response = self.execute(request).await?;
        self.client.parse_update(response)
    }

    #[instrument(skip_all, fields(resource = R::NAME, id = %id))]
    pub async fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        let response = self.execute(self.client.build_delete(id)).await?;
        self.client.parse_delete(response)
    }
}
