//! Page math shared by the API handlers and the gallery state machine.
//!
//! Pages are 1-based. A listing of `total` items at `page_size` items per
//! page spans `ceil(total / page_size)` pages, and `has_more` is true on
//! every page except the last.

use serde::Deserialize;

use crate::defaults::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Number of pages needed to cover `total` items at `page_size` per page.
///
/// Zero items is zero pages. `page_size` must be non-zero; callers clamp
/// via [`PageQuery`] before reaching this.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}

/// Row offset for a 1-based page number.
pub fn page_to_offset(page: u32, page_size: u32) -> u64 {
    (page.saturating_sub(1) as u64) * page_size as u64
}

/// Whether any items remain after the page holding `offset + returned`.
pub fn has_more(offset: u64, returned: usize, total: u64) -> bool {
    offset + (returned as u64) < total
}

/// Query-string pagination parameters with defaulting and clamping.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// 1-based page number. Defaults to 1; zero is treated as 1.
    pub page: Option<u32>,
    /// Page size. Defaults to [`DEFAULT_PAGE_SIZE`], capped at
    /// [`MAX_PAGE_SIZE`].
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Effective 1-based page.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for the effective page.
    pub fn offset(&self) -> u64 {
        page_to_offset(self.page(), self.limit())
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_exact_and_partial() {
        assert_eq!(page_count(0, 12), 0);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(page_count(25, 12), 3);
        assert_eq!(page_count(24, 12), 2);
    }

    #[test]
    fn test_offset_is_one_based() {
        assert_eq!(page_to_offset(1, 12), 0);
        assert_eq!(page_to_offset(3, 12), 24);
        assert_eq!(page_to_offset(0, 12), 0);
    }

    #[test]
    fn test_has_more_false_exactly_on_last_page() {
        // 25 photos at page size 12: pages of 12, 12, 1.
        assert!(has_more(0, 12, 25));
        assert!(has_more(12, 12, 25));
        assert!(!has_more(24, 1, 25));
        // Empty result
        assert!(!has_more(0, 0, 0));
    }

    #[test]
    fn test_page_query_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 12);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_page_query_clamps() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 100);

        let q = PageQuery {
            page: Some(2),
            limit: Some(0),
        };
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 1);
    }
}
