//! Areas (campuses, sites) that departments belong to.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;
use crate::validation::{code_format, not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArea {
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[validate(
        length(max = 20, message = "Code cannot exceed 20 characters"),
        custom(function = "code_format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArea {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(
        length(max = 20, message = "Code cannot exceed 20 characters"),
        custom(function = "code_format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaFilter {
    pub keyword: Option<String>,
}

impl Resource for Area {
    const NAME: &'static str = "areas";

    type Id = i64;
    type Entity = Area;
    type Create = CreateArea;
    type Update = UpdateArea;
    type Filter = AreaFilter;
}
