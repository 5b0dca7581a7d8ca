//! Scheduled lessons within a course.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::resource::Resource;
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLesson {
    #[validate(range(min = 1, message = "Course id must be positive"))]
    pub course_id: i64,
    #[validate(
        length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLesson {
    #[validate(range(min = 1, message = "Course id must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFilter {
    pub keyword: Option<String>,
    pub course_id: Option<i64>,
}

impl Resource for Lesson {
    const NAME: &'static str = "lessons";
    const RELATED: &'static [&'static str] = &["courses"];

    type Id = i64;
    type Entity = Lesson;
    type Create = CreateLesson;
    type Update = UpdateLesson;
    type Filter = LessonFilter;
}
