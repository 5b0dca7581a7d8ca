//! Application modules: the permission groups menus and roles hang off.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModule {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 50, message = "Code must be between 2 and 50 characters"))]
    pub code: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 999, message = "Sort order must be between 0 and 999"))]
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModule {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Code must be between 2 and 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 999, message = "Sort order must be between 0 and 999"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFilter {
    pub keyword: Option<String>,
}

impl Resource for Module {
    const NAME: &'static str = "modules";

    type Id = i64;
    type Entity = Module;
    type Create = CreateModule;
    type Update = UpdateModule;
    type Filter = ModuleFilter;
}
