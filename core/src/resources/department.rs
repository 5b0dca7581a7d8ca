//! Departments, optionally nested and attached to an area.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;
use crate::validation::code_format;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub area_id: Option<i64>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(
        length(max = 20, message = "Code cannot exceed 20 characters"),
        custom(function = "code_format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(range(min = 1, message = "Area id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<i64>,
    #[validate(range(min = 1, message = "Parent id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(
        length(max = 20, message = "Code cannot exceed 20 characters"),
        custom(function = "code_format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(range(min = 1, message = "Area id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<i64>,
    #[validate(range(min = 1, message = "Parent id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentFilter {
    pub keyword: Option<String>,
    pub area_id: Option<i64>,
    pub parent_id: Option<i64>,
}

impl Resource for Department {
    const NAME: &'static str = "departments";

    type Id = i64;
    type Entity = Department;
    type Create = CreateDepartment;
    type Update = UpdateDepartment;
    type Filter = DepartmentFilter;
}
