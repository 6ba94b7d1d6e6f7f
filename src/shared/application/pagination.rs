/// Pagination support for paged catalog endpoints
///
/// TMDB numbers pages from 1 and refuses anything above 500.
use serde::{Deserialize, Serialize};

use crate::shared::errors::{AppError, AppResult};

pub const FIRST_PAGE: u32 = 1;
pub const MAX_PAGE: u32 = 500;

/// One page of results as returned by a paged endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl<T> Page<T> {
    pub fn new(page: u32, results: Vec<T>, total_pages: u32, total_results: u32) -> Self {
        Self {
            page,
            results,
            total_pages,
            total_results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether no page follows this one
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            page: self.page,
            results: self.results.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

/// Reject page numbers the catalog would refuse anyway
pub fn validate_page(page: u32) -> AppResult<u32> {
    if (FIRST_PAGE..=MAX_PAGE).contains(&page) {
        Ok(page)
    } else {
        Err(AppError::InvalidInput(format!(
            "Page must be between {} and {}, got {}",
            FIRST_PAGE, MAX_PAGE, page
        )))
    }
}
