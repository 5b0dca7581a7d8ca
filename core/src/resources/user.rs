//! User accounts. Identified by UUID, unlike the other resources.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse, Multipart};
use crate::queries::ResourceQueries;
use crate::resource::{Resource, ResourceApi};
use crate::types::Envelope;
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub user_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub full_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 20, message = "Phone cannot exceed 20 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[validate(range(min = 1, message = "Department id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(email(message = "Invalid email format"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[validate(
        length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"),
        custom(function = "not_blank")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[validate(length(max = 20, message = "Phone cannot exceed 20 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[validate(range(min = 1, message = "Department id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub keyword: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
    pub role: Option<String>,
}

impl Resource for User {
    const NAME: &'static str = "users";
    const RELATED: &'static [&'static str] = &["departments"];

    type Id = Uuid;
    type Entity = User;
    type Create = CreateUser;
    type Update = UpdateUser;
    type Filter = UserFilter;
}

/// An image to attach to a user profile.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ResourceClient<User> {
    pub fn build_upload_avatar(&self, id: &Uuid, upload: &AvatarUpload) -> Result<HttpRequest, ApiError> {
        if upload.data.is_empty() {
            let mut errors = validator::ValidationErrors::new();
            errors.add(
                "file",
                crate::validation::rule_error("empty_file", "Avatar file is empty"),
            );
            return Err(ApiError::Validation(errors));
        }
        let form = Multipart::new().file(
            "file",
            &upload.file_name,
            &upload.content_type,
            upload.data.clone(),
        );
        Ok(HttpRequest::new(HttpMethod::Post, self.url(&format!("avatar/{id}")))
            .with_body(Body::Multipart(form)))
    }

    pub fn parse_upload_avatar(&self, response: HttpResponse) -> Result<Envelope<User>, ApiError> {
        self.parse_update(response)
    }
}

impl ResourceApi<User> {
    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn upload_avatar(&self, id: &Uuid, upload: &AvatarUpload) -> Result<Envelope<User>, ApiError> {
        let request = self.client().build_upload_avatar(id, upload)?;
        let response = self.execute(request).await?;
        self.client().parse_upload_avatar(response)
    }
}

impl ResourceQueries<User> {
    pub async fn upload_avatar(&self, id: &Uuid, upload: &AvatarUpload) -> Result<Envelope<User>, ApiError> {
        let mut keys = Self::collection_keys();
        keys.push(Self::detail_key(id));
        let api = self.api();
        self.client()
            .mutate(&keys, move || api.upload_avatar(id, upload))
            .await
    }
}
