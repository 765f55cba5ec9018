//! Page arithmetic and the pager state machine used by the list view.

use serde::Serialize;

use crate::domain::contact::PAGE_SIZE;

/// Number of pages needed for `total` records, never less than one.
pub fn total_pages(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Number of records a page is expected to hold for a collection of `total`.
pub fn expected_page_len(total: usize, page: usize) -> usize {
    let offset = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    total.saturating_sub(offset).min(PAGE_SIZE)
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, total: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };
        let total_pages = total_pages(total);

        Self {
            items,
            page: current_page,
            total,
            total_pages,
            has_prev: current_page > 1,
            has_next: current_page < total_pages,
        }
    }
}

/// Current page of one list view.
///
/// Moves are only applied when they stay within `1..=total_pages` of the last
/// known total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    current: usize,
    total: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            current: 1,
            total: 0,
        }
    }
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total)
    }

    /// Records the filtered collection size reported by the latest fetch.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Advances one page. Returns `false` when already on the last page.
    pub fn next(&mut self) -> bool {
        if self.current < self.total_pages() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Steps back one page. Returns `false` when already on the first page.
    pub fn prev(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// Resets to the first page when the current page lies past the end.
    /// Returns `true` when a clamp happened.
    pub fn clamp(&mut self) -> bool {
        if self.current > self.total_pages() {
            self.current = 1;
            true
        } else {
            false
        }
    }
}
