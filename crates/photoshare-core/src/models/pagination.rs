//! Cursor pagination shared by the feed and comment listings.
//!
//! Rows are ordered by `(created_at DESC, id DESC)`. A cursor is the id of the last row the
//! caller saw; the next page holds the rows strictly after that row's key. Engines fetch one
//! row beyond the page size so the last page can be recognised without an extra round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::ToSchema;

use crate::config::FeedConfig;
use crate::error::AppError;

/// Rows that can be listed with a cursor.
pub trait Paginated {
    /// `(created_at, id)`; ids break ties between equal timestamps.
    fn sort_key(&self) -> (DateTime<Utc>, i64);

    fn cursor_id(&self) -> i64 {
        self.sort_key().1
    }
}

/// Orders two keys newest first.
pub fn newest_first(a: &(DateTime<Utc>, i64), b: &(DateTime<Utc>, i64)) -> Ordering {
    b.cmp(a)
}

/// Whether `key` sorts strictly after `anchor` in newest-first order.
pub fn is_after(key: &(DateTime<Utc>, i64), anchor: &(DateTime<Utc>, i64)) -> bool {
    key < anchor
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<i64>,
    pub limit: u32,
}

impl PageRequest {
    /// Apply the configured default and clamp; a limit below one is rejected.
    pub fn resolve(
        after: Option<i64>,
        limit: Option<i64>,
        config: &FeedConfig,
    ) -> Result<Self, AppError> {
        let limit = match limit {
            None => config.default_limit,
            Some(n) if n < 1 => {
                return Err(AppError::Validation(format!(
                    "limit must be at least 1, got {}",
                    n
                )))
            }
            Some(n) => n.min(i64::from(config.max_limit)) as u32,
        };
        Ok(Self { after, limit })
    }

    /// Number of rows an engine should fetch: one past the page to detect the end.
    pub fn fetch_size(&self) -> i64 {
        i64::from(self.limit) + 1
    }
}

/// One page of results. `next_cursor` is absent on the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
}

impl<T: Paginated> Page<T> {
    /// Build a page from at most `limit + 1` ordered rows.
    pub fn from_lookahead(mut rows: Vec<T>, limit: u32) -> Self {
        let limit = limit as usize;
        if rows.len() > limit {
            rows.truncate(limit);
            let next_cursor = rows.last().map(Paginated::cursor_id);
            Self {
                items: rows,
                next_cursor,
            }
        } else {
            Self {
                items: rows,
                next_cursor: None,
            }
        }
    }
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}
