//! Wire envelopes and pagination parameters shared by every resource.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Single-item envelope: `{ data, message, succeeded? }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
}

/// One page of a list plus the size of the whole matching set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> Paginated<T> {
    /// Number of pages needed for `total_count` items; zero for an empty set.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_number) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }
}

/// Error body returned by the backend alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[validate(range(min = 1, message = "Page number starts at 1"))]
    pub page_number: u32,
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000"))]
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 10,
        }
    }
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }
}

/// Page selection plus a resource filter, serialised flat into one query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams<F> {
    #[serde(flatten)]
    pub page: PageRequest,
    #[serde(flatten)]
    pub filter: F,
}

impl<F: Default> ListParams<F> {
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self {
            page: PageRequest::new(page_number, page_size),
            filter: F::default(),
        }
    }
}

impl<F> ListParams<F> {
    pub fn with_filter(page: PageRequest, filter: F) -> Self {
        Self { page, filter }
    }

    /// Filters are all optional; only the page selection carries constraints.
    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.page.validate()
    }
}
