//! Navigation menu entries, assignable to roles.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::client::{decode, ensure_success, ResourceClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::queries::{QueryOptions, QueryState, ResourceQueries};
use crate::resource::{Resource, ResourceApi};
use crate::types::Envelope;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub module_id: Option<i64>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenu {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 255, message = "URL cannot exceed 255 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[validate(length(max = 50, message = "Icon cannot exceed 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
    #[validate(range(min = 0, max = 999, message = "Order must be between 0 and 999"))]
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenu {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(max = 255, message = "URL cannot exceed 255 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[validate(length(max = 50, message = "Icon cannot exceed 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
    #[validate(range(min = 0, max = 999, message = "Order must be between 0 and 999"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuFilter {
    pub keyword: Option<String>,
    pub parent_id: Option<i64>,
    pub module_id: Option<i64>,
}

impl Resource for Menu {
    const NAME: &'static str = "menus";

    type Id = i64;
    type Entity = Menu;
    type Create = CreateMenu;
    type Update = UpdateMenu;
    type Filter = MenuFilter;
}

impl ResourceClient<Menu> {
    pub fn build_by_role(&self, role_id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url(&format!("by-role/{role_id}")))
    }

    pub fn parse_by_role(&self, response: HttpResponse) -> Result<Vec<Menu>, ApiError> {
        ensure_success(&response)?;
        let envelope: Envelope<Vec<Menu>> = decode(&response)?;
        Ok(envelope.data)
    }
}

impl ResourceApi<Menu> {
    /// Menus visible to a role.
    #[instrument(skip(self))]
    pub async fn by_role(&self, role_id: i64) -> Result<Vec<Menu>, ApiError> {
        let response = self.execute(self.client().build_by_role(role_id)).await?;
        self.client().parse_by_role(response)
    }
}

impl ResourceQueries<Menu> {
    /// Sits under the list prefix, so any menu mutation makes it stale.
    pub fn by_role_key(role_id: i64) -> crate::cache::QueryKey {
        Self::lists_key().with("by-role").with(role_id)
    }

    pub async fn by_role(&self, role_id: i64, options: QueryOptions) -> QueryState<Vec<Menu>> {
        let api = &self.api().clone().with_signal(options.signal.clone());
        self.client()
            .query(Self::by_role_key(role_id), &options, move || api.by_role(role_id))
            .await
    }
}
