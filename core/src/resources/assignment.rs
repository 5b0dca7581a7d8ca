//! Graded work set for a course, optionally tied to a lesson.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub lesson_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub max_score: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    #[validate(range(min = 1, message = "Course id must be positive"))]
    pub course_id: i64,
    #[validate(range(min = 1, message = "Lesson id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<i64>,
    #[validate(
        length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1000, message = "Max score must be between 1 and 1000"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignment {
    #[validate(range(min = 1, message = "Lesson id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<i64>,
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1000, message = "Max score must be between 1 and 1000"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFilter {
    pub keyword: Option<String>,
    pub course_id: Option<i64>,
    pub lesson_id: Option<i64>,
}

impl Resource for Assignment {
    const NAME: &'static str = "assignments";
    const RELATED: &'static [&'static str] = &["courses"];

    type Id = i64;
    type Entity = Assignment;
    type Create = CreateAssignment;
    type Update = UpdateAssignment;
    type Filter = AssignmentFilter;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_above_limit_is_rejected() {
        let input = CreateAssignment {
            course_id: 1,
            lesson_id: None,
            title: "Essay".to_string(),
            description: None,
            due_at: None,
            max_score: Some(5000),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_score"));
    }
}
