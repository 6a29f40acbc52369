//! Offset pagination arithmetic for the animal listing.

/// SQL LIMIT/OFFSET values are bound as signed 64-bit integers.
const MAX_SQL_BOUND: u64 = i64::MAX as u64;

/// A 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub per_page: u64,
}

impl PageRequest {
    /// Pages below 1 are clamped to 1; `per_page` is at least 1.
    pub fn new(page: i64, per_page: u64) -> Self {
        Self {
            page: page.max(1) as u64,
            per_page: per_page.clamp(1, MAX_SQL_BOUND),
        }
    }

    /// Rows to skip, saturating at the largest bindable offset.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(MAX_SQL_BOUND)
    }
}

/// `ceil(total / per_page)`, never less than one page.
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1)).max(1)
}
