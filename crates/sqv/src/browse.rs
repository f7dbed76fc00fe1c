//! State behind the Browse view: one table, its sort, filter and current page.

use crate::db::{Database, ResultSet, SortSpec};
use crate::error::QueryError;
use crate::pager::Pager;

#[derive(Debug, Clone)]
pub struct BrowseState {
    table: Option<String>,
    sort: Option<SortSpec>,
    filter: Option<String>,
    pub pager: Pager,
    page: ResultSet,
    error: Option<String>,
}

impl BrowseState {
    pub fn new(page_size: u64) -> Self {
        Self {
            table: None,
            sort: None,
            filter: None,
            pager: Pager::new(page_size),
            page: ResultSet::empty(),
            error: None,
        }
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Rows of the page fetched by the last successful [`BrowseState::load`].
    pub fn page(&self) -> &ResultSet {
        &self.page
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch to `name`, dropping sort and filter.
    pub fn open_table(&mut self, name: &str) {
        self.table = Some(name.to_string());
        self.sort = None;
        self.filter = None;
        self.pager.set_filter_active(false);
        self.pager.reset();
        self.page = ResultSet::empty();
        self.error = None;
    }

    /// Use `text` as the WHERE predicate. Blank text clears the filter.
    pub fn apply_filter(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.clear_filter();
            return;
        }
        self.filter = Some(text.to_string());
        self.pager.set_filter_active(true);
        self.pager.reset();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.pager.set_filter_active(false);
        self.pager.reset();
    }

    /// Sort on `column`, flipping direction if it is already the sort column.
    pub fn sort_by(&mut self, column: &str) {
        self.sort = Some(SortSpec::toggle(self.sort.as_ref(), column));
        self.pager.reset();
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    pub fn first_page(&mut self) -> bool {
        self.pager.first()
    }

    pub fn last_page(&mut self) -> bool {
        self.pager.last()
    }

    /// Refresh counts and fetch the current page. On failure the message is
    /// kept, the page is emptied and navigation is disabled.
    pub fn load(&mut self, db: &Database) -> Result<(), QueryError> {
        let Some(table) = self.table.clone() else {
            return Ok(());
        };

        match self.fetch(db, &table) {
            Ok(page) => {
                self.page = page;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                let msg = e.to_string();
                tracing::warn!(%table, error = %msg, "browse load failed");
                self.page = ResultSet::empty();
                self.pager.clear_counts();
                self.error = Some(msg);
                Err(e)
            }
        }
    }

    fn fetch(&mut self, db: &Database, table: &str) -> Result<ResultSet, QueryError> {
        let total = db.row_count(table)?;
        self.pager.set_total(total);
        if let Some(filter) = &self.filter {
            self.pager
                .effective_count_with(|| db.count_where(table, filter));
        }
        db.fetch_rows(
            table,
            self.pager.offset(),
            self.pager.page_size(),
            self.sort.as_ref(),
            self.filter.as_deref(),
        )
    }

    /// `Table: users | Filter: age > 30 | Sort: name ASC | PgUp/PgDn to navigate`
    pub fn status_text(&self) -> String {
        let Some(table) = &self.table else {
            return "Select a table | PgUp/PgDn to navigate | Click column header to sort"
                .to_string();
        };
        let mut parts = vec![format!("Table: {}", table)];
        if let Some(filter) = &self.filter {
            parts.push(format!("Filter: {}", filter));
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("Sort: {} {}", sort.column, sort.direction.as_sql()));
        }
        parts.push("PgUp/PgDn to navigate".to_string());
        parts.join(" | ")
    }
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new(crate::pager::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SortDirection;

    #[test]
    fn test_open_table_resets() {
        let mut b = BrowseState::new(10);
        b.open_table("users");
        b.apply_filter("age > 3");
        b.sort_by("age");
        b.open_table("posts");
        assert_eq!(b.table(), Some("posts"));
        assert!(b.filter().is_none());
        assert!(b.sort().is_none());
        assert_eq!(b.pager.offset(), 0);
    }

    #[test]
    fn test_blank_filter_clears() {
        let mut b = BrowseState::new(10);
        b.open_table("users");
        b.apply_filter("age > 3");
        assert!(b.pager.filter_active());
        b.apply_filter("   ");
        assert!(b.filter().is_none());
        assert!(!b.pager.filter_active());
    }

    #[test]
    fn test_sort_by_toggles() {
        let mut b = BrowseState::new(10);
        b.open_table("users");
        b.sort_by("name");
        assert_eq!(b.sort().map(|s| s.direction), Some(SortDirection::Asc));
        b.sort_by("name");
        assert_eq!(b.sort().map(|s| s.direction), Some(SortDirection::Desc));
        b.sort_by("age");
        assert_eq!(b.sort(), Some(&SortSpec::asc("age")));
    }

    #[test]
    fn test_status_text() {
        let mut b = BrowseState::new(10);
        assert!(b.status_text().starts_with("Select a table"));
        b.open_table("users");
        b.apply_filter("age > 30");
        b.sort_by("name");
        assert_eq!(
            b.status_text(),
            "Table: users | Filter: age > 30 | Sort: name ASC | PgUp/PgDn to navigate"
        );
    }
}
