//! # biblio Engine
//!
//! The machinery shared by all API wrappers: a [`Session`] holding the
//! configuration and HTTP client, the on-disk cache, single-record
//! retrieval and paged search.

mod cache;
mod retrieval;
mod search;
mod session;

pub use cache::{query_stem, retrieval_path, search_path, CacheInfo, Refresh, SearchQuery};
pub use retrieval::{retrieve, RetrievalRequest, Retrieved};
pub use search::{search, search_summary, SearchRequest, Searched};
pub use session::Session;
