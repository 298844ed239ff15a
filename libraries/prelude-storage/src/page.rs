/// Pagination window and result page shared by every list query
use serde::Serialize;

/// Rows to skip and the maximum number of rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Window covering the first `limit` rows
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    pub(crate) fn bind_limit(self) -> i64 {
        i64::from(self.limit)
    }

    pub(crate) fn bind_offset(self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}

/// One page of resources plus the total number of matching rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub resources: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            resources: self.resources.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
