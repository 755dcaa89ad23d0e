use serde::{Deserialize, Serialize};

/// A limit/offset window over a listing.
///
/// Values arriving from callers are clamped here, at the boundary, so
/// repositories can trust `limit > 0` and `offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    limit: i64,
    offset: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Builds a window from optional raw values.
    ///
    /// A missing or non-positive limit falls back to [`Self::DEFAULT_LIMIT`];
    /// limits above [`Self::MAX_LIMIT`] are capped. A missing or negative
    /// offset becomes zero.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(Self::MAX_LIMIT),
            _ => Self::DEFAULT_LIMIT,
        };
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}
