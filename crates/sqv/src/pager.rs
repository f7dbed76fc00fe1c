//! Offset/limit bookkeeping for paged result views.

use crate::format::group_thousands;

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 500;

/// Which navigation controls are currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavControls {
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
}

/// Page state for one view.
///
/// `offset` only moves in whole pages, so it stays a multiple of
/// `page_size`. Changing what is being paged (table, query, filter, sort)
/// must go through [`Pager::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    offset: u64,
    page_size: u64,
    total: u64,
    filtered: Option<u64>,
    filter_active: bool,
}

impl Pager {
    pub fn new(page_size: u64) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            total: 0,
            filtered: None,
            filter_active: false,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Update the unfiltered row count.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    /// Mark whether a filter is in effect. The filtered count is supplied
    /// separately through [`Pager::effective_count_with`].
    pub fn set_filter_active(&mut self, active: bool) {
        if self.filter_active != active {
            self.filtered = None;
        }
        self.filter_active = active;
    }

    pub fn filter_active(&self) -> bool {
        self.filter_active
    }

    /// Cached filtered count, if one has been computed since the last reset.
    pub fn cached_filtered(&self) -> Option<u64> {
        self.filtered
    }

    /// Back to the first page; forgets the cached filtered count.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.filtered = None;
    }

    /// Drop to an empty state that disables every control, keeping the
    /// filter flag. Used when the counts could not be obtained.
    pub fn clear_counts(&mut self) {
        self.offset = 0;
        self.total = 0;
        self.filtered = self.filter_active.then_some(0);
    }

    /// Count used for page math. With a filter active the count is computed
    /// once through `count` and cached until the next reset.
    pub fn effective_count_with<E>(&mut self, count: impl FnOnce() -> Result<u64, E>) -> u64 {
        if !self.filter_active {
            return self.total;
        }
        if let Some(n) = self.filtered {
            return n;
        }
        // A failing count is cached as zero; the fetch that follows reports
        // the actual error.
        let n = count().unwrap_or(0);
        self.filtered = Some(n);
        n
    }

    /// Count for a pager whose filtered count (if any) is already cached.
    pub fn effective_count(&self) -> u64 {
        if self.filter_active {
            self.filtered.unwrap_or(0)
        } else {
            self.total
        }
    }

    pub fn can_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn can_next(&self) -> bool {
        self.offset + self.page_size < self.effective_count()
    }

    pub fn controls(&self) -> NavControls {
        let back = self.can_prev();
        let forward = self.can_next();
        NavControls {
            first: back,
            prev: back,
            next: forward,
            last: forward,
        }
    }

    /// Advance one page. Returns false when already on the last page.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.offset += self.page_size;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.page_size);
        true
    }

    pub fn first(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.offset = 0;
        true
    }

    /// Jump to the page holding the last row. Only meaningful when there is
    /// more than one page.
    pub fn last(&mut self) -> bool {
        let effective = self.effective_count();
        if effective <= self.page_size {
            return false;
        }
        self.offset = ((effective - 1) / self.page_size) * self.page_size;
        true
    }

    /// `Rows 1-500 of 1,234` for a page that loaded `loaded` rows.
    pub fn label(&self, loaded: usize) -> String {
        let effective = self.effective_count();
        if effective == 0 {
            return "No matching rows".to_string();
        }
        let loaded = loaded as u64;
        let start = if loaded > 0 { self.offset + 1 } else { 0 };
        let end = self.offset + loaded;
        format!(
            "Rows {}-{} of {}",
            group_thousands(start),
            group_thousands(end),
            group_thousands(effective)
        )
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pager(total: u64) -> Pager {
        let mut p = Pager::new(100);
        p.set_total(total);
        p
    }

    #[test]
    fn test_first_page_controls() {
        let p = pager(500);
        assert_eq!(
            p.controls(),
            NavControls {
                first: false,
                prev: false,
                next: true,
                last: true,
            }
        );
    }

    #[test]
    fn test_last_page_controls() {
        let mut p = pager(500);
        while p.next() {}
        assert_eq!(p.offset(), 400);
        assert_eq!(
            p.controls(),
            NavControls {
                first: true,
                prev: true,
                next: false,
                last: false,
            }
        );
    }

    #[test]
    fn test_last_from_anywhere() {
        for start_pages in 0..5 {
            let mut p = pager(500);
            for _ in 0..start_pages {
                p.next();
            }
            assert!(p.last());
            assert_eq!(p.offset(), 400);
        }
    }

    #[test]
    fn test_last_with_partial_page() {
        let mut p = pager(501);
        assert!(p.last());
        assert_eq!(p.offset(), 500);
        assert!(!p.can_next());
    }

    #[test]
    fn test_last_not_valid_on_single_page() {
        let mut p = pager(100);
        assert!(!p.last());
        assert_eq!(p.offset(), 0);
        assert_eq!(p.controls(), NavControls::default());
    }

    #[test]
    fn test_prev_and_first() {
        let mut p = pager(1000);
        p.next();
        p.next();
        assert_eq!(p.offset(), 200);
        assert!(p.prev());
        assert_eq!(p.offset(), 100);
        assert!(p.first());
        assert_eq!(p.offset(), 0);
        assert!(!p.prev());
        assert!(!p.first());
    }

    #[test]
    fn test_offset_stays_page_aligned() {
        let mut p = pager(1234);
        p.last();
        p.prev();
        p.next();
        p.prev();
        assert_eq!(p.offset() % 100, 0);
    }

    #[test]
    fn test_reset_clears_offset_and_filtered_count() {
        let mut p = pager(500);
        p.set_filter_active(true);
        assert_eq!(p.effective_count_with(|| Ok::<_, ()>(250)), 250);
        p.next();
        p.reset();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.cached_filtered(), None);
    }

    #[test]
    fn test_filtered_count_is_cached() {
        let mut p = pager(500);
        p.set_filter_active(true);
        let mut calls = 0;
        for _ in 0..3 {
            let n = p.effective_count_with(|| {
                calls += 1;
                Ok::<_, ()>(42)
            });
            assert_eq!(n, 42);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failed_filtered_count_is_zero() {
        let mut p = pager(500);
        p.set_filter_active(true);
        assert_eq!(p.effective_count_with(|| Err("syntax error")), 0);
        assert_eq!(p.label(0), "No matching rows");
    }

    #[test]
    fn test_unfiltered_count_is_total() {
        let mut p = pager(500);
        assert_eq!(p.effective_count_with(|| Ok::<_, ()>(1)), 500);
    }

    #[test]
    fn test_clear_counts_disables_navigation() {
        let mut p = pager(1000);
        p.set_filter_active(true);
        p.effective_count_with(|| Ok::<_, ()>(800));
        p.next();
        p.clear_counts();
        assert_eq!(p.controls(), NavControls::default());
        assert_eq!(p.cached_filtered(), Some(0));
    }

    #[test]
    fn test_label() {
        let mut p = Pager::new(500);
        p.set_total(1234);
        assert_eq!(p.label(500), "Rows 1-500 of 1,234");
        p.next();
        p.next();
        assert_eq!(p.label(234), "Rows 1,001-1,234 of 1,234");
    }
}
