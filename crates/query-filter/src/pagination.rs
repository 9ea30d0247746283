//! Pagination arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Page size used when a request does not name one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of items to skip before `page` (1-based).
pub fn offset(page: usize, size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(size)
}

/// Number of pages needed for `total` items; zero when there are no items.
pub fn total_pages(total: usize, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    total.div_ceil(size)
}

/// Returns true if a page follows `page`.
pub fn has_next(page: usize, pages: usize) -> bool {
    page < pages
}

/// Returns true if a page precedes `page`; an empty result has no pages.
pub fn has_prev(page: usize, pages: usize) -> bool {
    page > 1 && pages > 0
}

/// A validated page/size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPage` if `page` or `size` is zero.
    pub fn new(page: usize, size: usize) -> FilterResult<Self> {
        if page == 0 {
            return Err(FilterError::invalid_page("page must be at least 1"));
        }
        if size == 0 {
            return Err(FilterError::invalid_page("size must be at least 1"));
        }
        Ok(Self { page, size })
    }

    /// Number of items to skip.
    pub fn offset(&self) -> usize {
        offset(self.page, self.size)
    }

    /// Maximum number of items on the page.
    pub fn limit(&self) -> usize {
        self.size
    }
}

/// One page of results plus the bookkeeping around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// Cuts the page described by `request` out of the full result list.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();

        Self {
            items,
            total,
            page: request.page,
            size: request.size,
            pages: total_pages(total, request.size),
        }
    }

    /// Wraps the full result list as a single page.
    pub fn unpaged(all: Vec<T>) -> Self {
        let total = all.len();
        Self {
            items: all,
            total,
            page: 1,
            size: total,
            pages: total_pages(total, total),
        }
    }

    /// Returns true if a page follows this one.
    pub fn has_next(&self) -> bool {
        has_next(self.page, self.pages)
    }

    /// Returns true if a page precedes this one.
    pub fn has_prev(&self) -> bool {
        has_prev(self.page, self.pages)
    }

    /// Maps the items, keeping the bookkeeping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(offset(3, 20), 40);
        assert_eq!(offset(1, 10), 0);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(0, 20), 0);
        assert!(has_next(1, 2));
        assert!(!has_next(2, 2));
        assert!(!has_prev(1, 2));
        assert!(has_prev(2, 2));
        assert!(has_prev(3, 2));
        assert!(!has_prev(2, 0));
    }

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(1, 10).is_ok());
        assert!(matches!(
            PageRequest::new(0, 10),
            Err(FilterError::InvalidPage { .. })
        ));
        assert!(PageRequest::new(1, 0).is_err());
        assert_eq!(PageRequest::default(), PageRequest { page: 1, size: 10 });
    }

    #[test]
    fn test_slice() {
        let page = Page::slice((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10).unwrap());
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_slice_past_end_is_empty() {
        let page = Page::slice(vec![1, 2], PageRequest::new(5, 10).unwrap());
        assert!(page.items.is_empty());
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn test_unpaged() {
        let page = Page::unpaged(vec!["a", "b"]);
        assert_eq!(page.pages, 1);
        assert!(!page.has_next());
        assert_eq!(Page::<u8>::unpaged(vec![]).pages, 0);
    }
}
