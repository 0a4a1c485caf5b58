//! Data models for the application
//!
//! Media records are owned by the catalog; likes and comments by the engagement ledger.
//! Pagination types are shared by the feed and comment listings.

mod engagement;
mod media;
mod pagination;

pub use engagement::*;
pub use media::*;
pub use pagination::*;
