//! Page-number pagination for post listings.

use std::num::IntErrorKind;

use serde::Serialize;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Splits a listing of known length into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: u64,
}

/// The slice of a listing selected by a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number actually served.
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

impl Paginator {
    /// A zero page size is treated as one.
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of pages for `total` items. An empty listing still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size).max(1)
    }

    /// Resolve the raw `page` request parameter against a listing of `total` items.
    ///
    /// Missing or non-numeric input selects the first page, `last` selects the
    /// last one, and numbers outside the valid range clamp to the nearest end.
    pub fn window(&self, requested: Option<&str>, total: u64) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested.map(str::trim) {
            Some("last") => num_pages,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => n.clamp(1, num_pages as i64) as u64,
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => num_pages,
                Err(_) => 1,
            },
            None => 1,
        };

        PageWindow {
            number,
            num_pages,
            offset: (number - 1) * self.page_size,
            limit: self.page_size,
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_of_ten() {
        let paginator = Paginator::new(10);

        let first = paginator.window(Some("1"), 25);
        assert_eq!((first.number, first.offset, first.limit), (1, 0, 10));
        assert_eq!(first.num_pages, 3);

        let third = paginator.window(Some("3"), 25);
        assert_eq!((third.number, third.offset), (3, 20));
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let paginator = Paginator::new(10);
        assert_eq!(
            paginator.window(Some("99"), 25),
            paginator.window(Some("3"), 25)
        );
        assert_eq!(
            paginator.window(Some("0"), 25),
            paginator.window(Some("1"), 25)
        );
        assert_eq!(paginator.window(Some("-4"), 25).number, 1);
    }

    #[test]
    fn numbers_too_large_to_parse_still_clamp() {
        let paginator = Paginator::new(10);
        assert_eq!(
            paginator.window(Some("99999999999999999999"), 25).number,
            3
        );
        assert_eq!(
            paginator.window(Some("-99999999999999999999"), 25).number,
            1
        );
        assert_eq!(paginator.window(Some("12abc"), 25).number, 1);
    }

    #[test]
    fn junk_and_missing_select_first_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.window(None, 25).number, 1);
        assert_eq!(paginator.window(Some("abc"), 25).number, 1);
        assert_eq!(paginator.window(Some(""), 25).number, 1);
        assert_eq!(paginator.window(Some("last"), 25).number, 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let paginator = Paginator::default();
        let window = paginator.window(Some("5"), 0);
        assert_eq!((window.number, window.num_pages, window.offset), (1, 1, 0));

        let page: Page<u8> = Page::new(Vec::new(), window, 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        assert_eq!(Paginator::new(10).num_pages(20), 2);
        assert_eq!(Paginator::new(0).page_size(), 1);
    }
}
