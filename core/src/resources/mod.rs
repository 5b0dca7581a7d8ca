//! Resource definitions: entity shapes, DTO schemas and filters.
//!
//! Each resource type doubles as its own `Resource` marker, so
//! `client.resource::<Course>()` reads naturally. DTOs carry their
//! constraints as `validator` attributes; update DTOs are all-optional and
//! skip absent fields when serialised, so an update only touches what it
//! names.

pub mod area;
pub mod assignment;
pub mod attendance;
pub mod course;
pub mod department;
pub mod lesson;
pub mod menu;
pub mod module;
pub mod role;
pub mod user;

pub use area::{Area, AreaFilter, CreateArea, UpdateArea};
pub use assignment::{Assignment, AssignmentFilter, CreateAssignment, UpdateAssignment};
pub use attendance::{Attendance, AttendanceFilter, AttendanceStatus, CreateAttendance, UpdateAttendance};
pub use course::{Course, CourseFilter, CreateCourse, UpdateCourse};
pub use department::{CreateDepartment, Department, DepartmentFilter, UpdateDepartment};
pub use lesson::{CreateLesson, Lesson, LessonFilter, UpdateLesson};
pub use menu::{CreateMenu, Menu, MenuFilter, UpdateMenu};
pub use module::{CreateModule, Module, ModuleFilter, UpdateModule};
pub use role::{AssignMenus, CreateRole, Role, RoleFilter, UpdateRole};
pub use user::{AvatarUpload, CreateUser, UpdateUser, User, UserFilter};
