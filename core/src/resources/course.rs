//! Courses offered by a department.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::resource::Resource;
use crate::validation::{code_format, rule_error};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub department_id: Option<i64>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub is_published: bool,
}

fn ordered(starts_on: Option<NaiveDate>, ends_on: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (starts_on, ends_on) {
        (Some(start), Some(end)) if end < start => Err(rule_error(
            "date_order",
            "Course cannot end before it starts",
        )),
        _ => Ok(()),
    }
}

fn validate_create_dates(input: &CreateCourse) -> Result<(), ValidationError> {
    ordered(input.starts_on, input.ends_on)
}

fn validate_update_dates(input: &UpdateCourse) -> Result<(), ValidationError> {
    ordered(input.starts_on, input.ends_on)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateCourse {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: String,
    #[validate(
        length(min = 2, max = 20, message = "Code must be between 2 and 20 characters"),
        custom(function = "code_format")
    )]
    pub code: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Department id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub is_published: bool,
}

/// Only checks date order when both dates are in the same update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateCourse {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(
        length(min = 2, max = 20, message = "Code must be between 2 and 20 characters"),
        custom(function = "code_format")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Department id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    pub keyword: Option<String>,
    pub department_id: Option<i64>,
    pub is_published: Option<bool>,
}

impl Resource for Course {
    const NAME: &'static str = "courses";

    type Id = i64;
    type Entity = Course;
    type Create = CreateCourse;
    type Update = UpdateCourse;
    type Filter = CourseFilter;
}
