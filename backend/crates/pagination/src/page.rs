//! Pagination envelope returned by listing endpoints.

use serde::{Deserialize, Serialize};

use crate::{PageLinks, PageRequest};

/// Totals describing where a page sits in the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number that was served.
    pub page: u32,
    /// Page size used for the query.
    pub limit: u32,
    /// Number of rows matching the query across all pages.
    pub total: u64,
    /// Number of pages needed to cover `total` rows.
    pub pages: u64,
}

impl PageInfo {
    /// Derive totals for `request` against a result set of `total` rows.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        let limit = request.limit() as u64;
        Self {
            page: request.page(),
            limit: request.limit(),
            total,
            pages: total.div_ceil(limit),
        }
    }

    /// Whether a further page exists after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page as u64) < self.pages
    }

    /// Whether a page exists before this one.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// A single page of results plus its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Totals for the query.
    pub pagination: PageInfo,
    /// Navigation links, present when the caller supplied a base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl<T> Page<T> {
    /// Wrap `items` fetched for `request` out of `total` matching rows.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total),
            links: None,
        }
    }

    /// Attach navigation links.
    #[must_use]
    pub fn with_links(mut self, links: PageLinks) -> Self {
        self.links = Some(links);
        self
    }

    /// Convert every item while keeping the totals.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
            links: self.links,
        }
    }
}
