//! Parsing of raw `page`/`limit` query parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the client does not supply `limit`.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a client may request; larger values are clamped.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while validating pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Pages are numbered from one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one item.
    #[error("limit must be at least 1")]
    ZeroLimit,
}

/// Raw pagination parameters as they arrive on the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Requested page size.
    pub limit: Option<u32>,
}

/// Validated page request.
///
/// ## Invariants
/// - `page >= 1`
/// - `1 <= limit <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request from explicit values.
    ///
    /// # Errors
    /// Returns [`PaginationError`] when `page` or `limit` is zero.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::ZeroPage);
        }
        if limit == 0 {
            return Err(PaginationError::ZeroLimit);
        }
        let clamped = if limit > MAX_LIMIT { MAX_LIMIT } else { limit };
        Ok(Self {
            page,
            limit: clamped,
        })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size after clamping.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows the store should skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TryFrom<PageParams> for PageRequest {
    type Error = PaginationError;

    fn try_from(params: PageParams) -> Result<Self, Self::Error> {
        Self::new(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}
