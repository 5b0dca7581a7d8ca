//! Roles and their menu assignments.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::client::{json_request, ResourceClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::queries::ResourceQueries;
use crate::resource::{Resource, ResourceApi};
use crate::resources::menu::Menu;
use crate::types::Envelope;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub menu_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRole {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 250, message = "Description cannot exceed 250 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRole {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(max = 250, message = "Description cannot exceed 250 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFilter {
    pub keyword: Option<String>,
}

/// Replaces the full set of menus a role can see.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignMenus {
    #[validate(length(max = 500, message = "Too many menus in one assignment"))]
    pub menu_ids: Vec<i64>,
}

impl Resource for Role {
    const NAME: &'static str = "roles";

    type Id = i64;
    type Entity = Role;
    type Create = CreateRole;
    type Update = UpdateRole;
    type Filter = RoleFilter;
}

impl ResourceClient<Role> {
    pub fn build_assign_menus(&self, role_id: i64, input: &AssignMenus) -> Result<HttpRequest, ApiError> {
        input.validate()?;
        json_request(HttpMethod::Post, self.url(&format!("assign-menus/{role_id}")), input)
    }

    pub fn parse_assign_menus(&self, response: HttpResponse) -> Result<Envelope<Role>, ApiError> {
        self.parse_update(response)
    }
}

impl ResourceApi<Role> {
    #[instrument(skip(self, input))]
    pub async fn assign_menus(&self, role_id: i64, input: &AssignMenus) -> Result<Envelope<Role>, ApiError> {
        let request = self.client().build_assign_menus(role_id, input)?;
        let response = self.execute(request).await?;
        self.client().parse_assign_menus(response)
    }
}

impl ResourceQueries<Role> {
    /// Also drops the cached menus-by-role read for this role.
    pub async fn assign_menus(&self, role_id: i64, input: &AssignMenus) -> Result<Envelope<Role>, ApiError> {
        let mut keys = Self::collection_keys();
        keys.push(Self::detail_key(&role_id));
        keys.push(ResourceQueries::<Menu>::by_role_key(role_id));
        let api = self.api();
        self.client()
            .mutate(&keys, move || api.assign_menus(role_id, input))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_assign_menus_posts_ids() {
        let client: ResourceClient<Role> = ResourceClient::new("http://localhost:5000/api");
        let req = client
            .build_assign_menus(2, &AssignMenus { menu_ids: vec![1, 5] })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5000/api/roles/assign-menus/2");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"menuIds": [1, 5]}));
    }
}
