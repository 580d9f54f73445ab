//! Pagination request and result envelope shared by every list query.

use serde::{Deserialize, Serialize};

use crate::{HashlockError, Result, constants};

/// A page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Reject `page == 0`, `limit == 0` and `limit > max_limit`.
    ///
    /// # Errors
    /// Returns `ValidationError` naming the offending field.
    pub fn validate(&self, max_limit: u32) -> Result<()> {
        if self.page == 0 {
            return Err(HashlockError::ValidationError {
                reason: "page must be >= 1".into(),
            });
        }
        if self.limit == 0 {
            return Err(HashlockError::ValidationError {
                reason: "limit must be >= 1".into(),
            });
        }
        if self.limit > max_limit {
            return Err(HashlockError::ValidationError {
                reason: format!("limit {} exceeds maximum {max_limit}", self.limit),
            });
        }
        Ok(())
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: constants::DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Navigation data for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    /// Number of results on this page.
    pub count: usize,
    pub page_count: u32,
    pub total_count: usize,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub first: u32,
    pub last: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Size of the filtered set before slicing.
    pub total_count: usize,
    pub meta: PageMeta,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slice an already filtered and ordered set.
    ///
    /// The caller validates `pagination` first. A page past the end is
    /// empty, not an error.
    #[must_use]
    pub fn slice(items: Vec<T>, pagination: Pagination) -> Self {
        let total_count = items.len();
        let limit = pagination.limit.max(1);
        let page_count = u32::try_from(total_count.div_ceil(limit as usize)).unwrap_or(u32::MAX);

        let results: Vec<T> = items
            .into_iter()
            .skip(pagination.offset())
            .take(limit as usize)
            .collect();

        let page = pagination.page;
        Self {
            total_count,
            meta: PageMeta {
                page,
                limit,
                count: results.len(),
                page_count,
                total_count,
                previous: (page > 1 && page - 1 <= page_count).then(|| page - 1),
                next: (page < page_count).then(|| page + 1),
                first: 1,
                last: page_count.max(1),
            },
            results,
        }
    }

    /// Map results, keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total_count: self.total_count,
            meta: self.meta,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
