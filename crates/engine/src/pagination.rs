use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Keeps `offset()` inside SQLite's signed 64-bit OFFSET range.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_LIMIT;

/// Page request. `page` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Clamps raw query values: page in `1..=MAX_PAGE`, limit in `1..=100`.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let total_pages = total.div_ceil(pagination.limit);
        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
            has_next_page: pagination.page < total_pages,
            has_prev_page: pagination.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_inputs() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, limit: 20 });
        assert_eq!(
            Pagination::new(Some(0), Some(0)),
            Pagination { page: 1, limit: 1 }
        );
        assert_eq!(Pagination::new(Some(3), Some(500)).limit, 100);
        assert_eq!(Pagination::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let pagination = Pagination::new(Some(u64::MAX), Some(u64::MAX));
        assert_eq!(pagination.page, MAX_PAGE);
        assert!(pagination.offset() <= i64::MAX as u64);

        let raw = Pagination {
            page: u64::MAX,
            limit: MAX_PAGE_LIMIT,
        };
        assert_eq!(raw.offset(), u64::MAX);
        let zero = Pagination { page: 0, limit: 20 };
        assert_eq!(zero.offset(), 0);
    }

    #[test]
    fn page_metadata() {
        let page = Page::new(vec![1, 2], 45, Pagination::new(Some(2), Some(20)));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);

        let empty: Page<u8> = Page::new(Vec::new(), 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }
}
