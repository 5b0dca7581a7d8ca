//! Per-lesson attendance records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::resource::Resource;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: i64,
    pub lesson_id: i64,
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendance {
    #[validate(range(min = 1, message = "Lesson id must be positive"))]
    pub lesson_id: i64,
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "Note cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[validate(length(max = 500, message = "Note cannot exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    pub keyword: Option<String>,
    pub lesson_id: Option<i64>,
    pub user_id: Option<Uuid>,
    pub status: Option<AttendanceStatus>,
}

impl Resource for Attendance {
    const NAME: &'static str = "attendances";
    const RELATED: &'static [&'static str] = &["lessons"];

    type Id = i64;
    type Entity = Attendance;
    type Create = CreateAttendance;
    type Update = UpdateAttendance;
    type Filter = AttendanceFilter;
}
