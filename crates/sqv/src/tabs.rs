//! Query tabs in the Execute SQL view.

use std::time::Duration;

use crate::db::{CellValue, Database, ResultSet};
use crate::pager::Pager;

/// Stable handle for a tab. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u32);

impl TabId {
    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Outcome of the last run in a tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabStatus {
    Idle,
    Success { rows: usize, elapsed: Duration },
    Error(String),
}

impl TabStatus {
    pub fn message(&self) -> Option<String> {
        match self {
            TabStatus::Idle => None,
            TabStatus::Success { rows, elapsed } => Some(format!(
                "Success: {} rows returned in {:.4}s",
                rows,
                elapsed.as_secs_f64()
            )),
            TabStatus::Error(msg) => Some(format!("Error: {}", msg)),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TabStatus::Error(_))
    }
}

#[derive(Debug, Clone)]
pub struct QueryTab {
    pub id: TabId,
    pub query: String,
    pub result: ResultSet,
    pub pager: Pager,
    pub status: TabStatus,
}

impl QueryTab {
    fn new(id: TabId, query: String, page_size: u64) -> Self {
        Self {
            id,
            query,
            result: ResultSet::empty(),
            pager: Pager::new(page_size),
            status: TabStatus::Idle,
        }
    }

    pub fn title(&self) -> String {
        format!("Query {}", self.id.0)
    }

    /// Run the tab's query, replacing its result and status. Errors are kept
    /// in the tab, not propagated.
    pub fn run(&mut self, db: &Database) {
        match db.execute(&self.query) {
            Ok(exec) => {
                self.status = TabStatus::Success {
                    rows: exec.result.row_count(),
                    elapsed: exec.elapsed,
                };
                self.pager.set_total(exec.result.row_count() as u64);
                self.result = exec.result;
            }
            Err(e) => {
                self.status = TabStatus::Error(e.to_string());
                self.result = ResultSet::empty();
                self.pager.set_total(0);
            }
        }
        self.pager.reset();
    }

    /// Rows on the current page of the in-memory result.
    pub fn page_rows(&self) -> &[Vec<CellValue>] {
        self.result.window(
            self.pager.offset() as usize,
            self.pager.page_size() as usize,
        )
    }
}

/// Bounded set of tabs with one active at a time.
#[derive(Debug)]
pub struct Tabs {
    tabs: Vec<QueryTab>,
    active: usize,
    next_id: u32,
    max_tabs: usize,
    page_size: u64,
    default_query: String,
}

impl Tabs {
    /// Starts with one tab holding `default_query`.
    pub fn new(max_tabs: usize, page_size: u64, default_query: &str) -> Self {
        let mut tabs = Self {
            tabs: Vec::new(),
            active: 0,
            next_id: 1,
            max_tabs: max_tabs.max(1),
            page_size,
            default_query: default_query.to_string(),
        };
        tabs.push_tab();
        tabs
    }

    fn push_tab(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        self.tabs
            .push(QueryTab::new(id, self.default_query.clone(), self.page_size));
        self.active = self.tabs.len() - 1;
        id
    }

    /// Open a new tab and make it active. None when the limit is reached.
    pub fn add(&mut self) -> Option<TabId> {
        if self.tabs.len() >= self.max_tabs {
            return None;
        }
        Some(self.push_tab())
    }

    /// Close `id`. The last remaining tab cannot be closed.
    pub fn close(&mut self, id: TabId) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        let Some(idx) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tabs.remove(idx);
        if self.active > idx || self.active >= self.tabs.len() {
            self.active = self.active.saturating_sub(1);
        }
        true
    }

    pub fn close_active(&mut self) -> bool {
        let id = self.active().id;
        self.close(id)
    }

    /// Activate the tab at `index` (0-based). False when out of range.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &QueryTab {
        &self.tabs[self.active]
    }

    pub fn active_mut(&mut self) -> &mut QueryTab {
        &mut self.tabs[self.active]
    }

    pub fn get(&self, id: TabId) -> Option<&QueryTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryTab> {
        self.tabs.iter()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs() -> Tabs {
        Tabs::new(5, 100, "SELECT 1;")
    }

    #[test]
    fn test_starts_with_one_tab() {
        let t = tabs();
        assert_eq!(t.len(), 1);
        assert_eq!(t.active().query, "SELECT 1;");
        assert_eq!(t.active().title(), "Query 1");
    }

    #[test]
    fn test_add_is_bounded() {
        let mut t = tabs();
        for _ in 0..4 {
            assert!(t.add().is_some());
        }
        assert_eq!(t.len(), 5);
        assert!(t.add().is_none());
        assert_eq!(t.active_index(), 4);
    }

    #[test]
    fn test_last_tab_cannot_close() {
        let mut t = tabs();
        assert!(!t.close_active());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_ids_not_reused() {
        let mut t = tabs();
        let second = t.add().unwrap();
        assert!(t.close(second));
        let third = t.add().unwrap();
        assert_ne!(second, third);
        assert_eq!(third.get(), 3);
        assert!(t.get(second).is_none());
    }

    #[test]
    fn test_close_keeps_active_in_range() {
        let mut t = tabs();
        let b = t.add().unwrap();
        let c = t.add().unwrap();
        assert_eq!(t.active().id, c);
        assert!(t.close(c));
        assert_eq!(t.active().id, b);

        t.select_index(0);
        assert!(t.close(b));
        assert_eq!(t.active_index(), 0);
    }

    #[test]
    fn test_close_before_active_shifts_index() {
        let mut t = tabs();
        let first = t.active().id;
        let b = t.add().unwrap();
        assert!(t.close(first));
        assert_eq!(t.active().id, b);
    }

    #[test]
    fn test_select_index() {
        let mut t = tabs();
        t.add();
        assert!(t.select_index(0));
        assert_eq!(t.active_index(), 0);
        assert!(!t.select_index(3));
        assert_eq!(t.active_index(), 0);
    }

    #[test]
    fn test_tabs_are_independent() {
        let mut t = tabs();
        t.active_mut().query = "SELECT 2;".into();
        t.add();
        assert_eq!(t.active().query, "SELECT 1;");
        t.select_index(0);
        assert_eq!(t.active().query, "SELECT 2;");
    }

    #[test]
    fn test_status_message() {
        let ok = TabStatus::Success {
            rows: 1234,
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(
            ok.message().unwrap(),
            "Success: 1234 rows returned in 0.0120s"
        );
        assert_eq!(
            TabStatus::Error("no such table: x".into()).message().unwrap(),
            "Error: no such table: x"
        );
        assert!(TabStatus::Idle.message().is_none());
    }
}
