//! Pagination envelope shared by all listing operations.

use record_store::{PageRequest, Paged};
use serde::Serialize;

use crate::error::{DomainError, Result};

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    10
}

/// Validates 1-based page bounds once, at the service boundary.
pub fn page_request(page: u64, limit: u64) -> Result<PageRequest> {
    if page < 1 {
        return Err(DomainError::invalid_input("page must be at least 1"));
    }
    if limit < 1 {
        return Err(DomainError::invalid_input("limit must be at least 1"));
    }
    if limit > MAX_PAGE_LIMIT {
        return Err(DomainError::invalid_input(format!(
            "limit must be at most {MAX_PAGE_LIMIT}"
        )));
    }
    Ok(PageRequest::new(page, limit))
}

/// Pagination metadata attached to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageMeta {
    /// `total_pages` is `ceil(total / limit)`, and 0 when there are no rows.
    pub fn new(total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page(),
            limit: request.limit(),
            total_pages: total.div_ceil(request.limit()),
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(paged: Paged<T>, request: PageRequest) -> Self {
        Self {
            meta: PageMeta::new(paged.total, request),
            data: paged.rows,
        }
    }

    /// Maps the rows, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let request = page_request(1, 10).unwrap();
        assert_eq!(PageMeta::new(0, request).total_pages, 0);
        assert_eq!(PageMeta::new(1, request).total_pages, 1);
        assert_eq!(PageMeta::new(10, request).total_pages, 1);
        assert_eq!(PageMeta::new(11, request).total_pages, 2);
        assert_eq!(PageMeta::new(95, request).total_pages, 10);
    }

    #[test]
    fn out_of_range_bounds_are_rejected() {
        assert!(matches!(
            page_request(0, 10),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            page_request(1, 0),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            page_request(1, 101),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(page_request(1, 100).is_ok());
    }

    #[test]
    fn page_map_preserves_meta() {
        let request = page_request(2, 5).unwrap();
        let page = Page::new(
            Paged {
                rows: vec![1, 2, 3],
                total: 13,
            },
            request,
        );
        let mapped = page.map(|n| n * 2);
        assert_eq!(mapped.data, vec![2, 4, 6]);
        assert_eq!(mapped.meta.total, 13);
        assert_eq!(mapped.meta.page, 2);
        assert_eq!(mapped.meta.total_pages, 3);
    }
}
