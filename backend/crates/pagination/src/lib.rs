//! Page/limit pagination primitives shared by listing endpoints.
//!
//! Listing endpoints accept `page` and `limit` query parameters, translate
//! them into an offset for the store, and answer with a [`Page`] envelope
//! carrying the items, the totals, and navigation links.
//!
//! ```
//! use pagination::{PageParams, PageRequest};
//!
//! let request = PageRequest::try_from(PageParams { page: Some(3), limit: Some(20) })
//!     .expect("valid page request");
//! assert_eq!(request.offset(), 40);
//! ```

mod links;
mod page;
mod request;

pub use links::{LinkError, PageLinks};
pub use page::{Page, PageInfo};
pub use request::{DEFAULT_LIMIT, MAX_LIMIT, PageParams, PageRequest, PaginationError};
