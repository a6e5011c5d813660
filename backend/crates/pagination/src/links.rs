//! Navigation links for paginated listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::PageInfo;

/// Errors raised while building navigation links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidBase(#[from] url::ParseError),
}

/// `self`/`next`/`prev` links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub current: String,
    /// Link to the following page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Link to the preceding page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PageLinks {
    /// Build links from the request URL, replacing its `page` and `limit`
    /// parameters and keeping every other query parameter.
    ///
    /// # Errors
    /// Returns [`LinkError::InvalidBase`] when `base` is not an absolute URL.
    pub fn build(base: &str, info: &PageInfo) -> Result<Self, LinkError> {
        let url = Url::parse(base)?;
        let link_to = |page: u32| page_url(&url, page, info.limit);
        Ok(Self {
            current: link_to(info.page),
            next: info.has_next().then(|| link_to(info.page.saturating_add(1))),
            prev: info.has_prev().then(|| link_to(info.page.saturating_sub(1))),
        })
    }
}

fn page_url(base: &Url, page: u32, limit: u32) -> String {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page" && key != "limit")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("page", &page.to_string())
        .append_pair("limit", &limit.to_string());
    url.into()
}
