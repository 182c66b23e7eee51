//! Limit/offset pagination types
//!
//! # Usage
//!
//! ```rust,ignore
//! // In an action
//! let (limit, offset) = deps.page_limits.resolve(&input.page);
//!
//! // In a model
//! let (items, total) = ExpertRequest::list(&filter, pool).await?;
//!
//! Ok(Page::new(items, total, limit, offset))
//! ```

use serde::{Deserialize, Serialize};

/// Caller-supplied paging arguments; both are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Server-side bounds applied to every `PageRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 500,
        }
    }
}

impl PageLimits {
    /// Resolve to a concrete `(limit, offset)`.
    ///
    /// Missing or non-positive limits fall back to the default, oversized
    /// limits are clamped, negative offsets become zero.
    pub fn resolve(&self, request: &PageRequest) -> (i64, i64) {
        let limit = match request.limit {
            Some(limit) if limit > 0 => limit.min(self.max_limit),
            _ => self.default_limit,
        };
        let offset = request.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
