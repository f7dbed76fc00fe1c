use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::DisplayConfig;
use crate::db::{CellValue, SortSpec};
use crate::format::preview_cell;
use crate::inspect::CellRef;

/// Width of the cursor marker column on the left.
const MARKER_W: u16 = 2;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GridState {
    pub row_offset: usize,
    pub col_offset: usize,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl GridState {
    /// Move the cell cursor. Returns true if it moved.
    pub fn handle_key(&mut self, key: KeyEvent, model: &GridModel) -> bool {
        let row_count = model.rows.len();
        let col_count = model.columns.len();
        if row_count == 0 || col_count == 0 {
            return false;
        }
        let before = (self.cursor_row, self.cursor_col);

        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                self.cursor_row = (self.cursor_row + 1).min(row_count - 1);
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                self.cursor_col = (self.cursor_col + 1).min(col_count - 1);
            }
            (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.cursor_row = 0;
            }
            (KeyCode::Char('G'), _) => {
                self.cursor_row = row_count - 1;
            }
            (KeyCode::Char('0'), KeyModifiers::NONE) => {
                self.cursor_col = 0;
            }
            (KeyCode::Char('$'), _) => {
                self.cursor_col = col_count - 1;
            }
            _ => {}
        }

        before != (self.cursor_row, self.cursor_col)
    }

    /// The cursor position as a cell reference within the current rows.
    pub fn cursor(&self) -> CellRef {
        CellRef::new(self.cursor_row, self.cursor_col)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scroll so the cursor cell is inside a body of `viewport_rows` lines and
    /// `viewport_width` columns (marker excluded).
    pub fn ensure_cursor_visible(
        &mut self,
        viewport_rows: usize,
        viewport_width: u16,
        model: &GridModel,
    ) {
        let row_count = model.rows.len();
        if viewport_rows == 0 || row_count == 0 {
            self.row_offset = 0;
            self.cursor_row = 0;
        } else {
            self.cursor_row = self.cursor_row.min(row_count - 1);
            if self.cursor_row < self.row_offset {
                self.row_offset = self.cursor_row;
            }
            let last_visible = self.row_offset + viewport_rows - 1;
            if self.cursor_row > last_visible {
                self.row_offset = self.cursor_row + 1 - viewport_rows;
            }
        }

        let col_count = model.col_widths.len();
        if col_count == 0 {
            self.col_offset = 0;
            self.cursor_col = 0;
            return;
        }
        self.cursor_col = self.cursor_col.min(col_count - 1);
        if self.cursor_col < self.col_offset {
            self.col_offset = self.cursor_col;
        }
        while self.col_offset < self.cursor_col
            && span_width(&model.col_widths[self.col_offset..=self.cursor_col]) > viewport_width
        {
            self.col_offset += 1;
        }
    }

    /// [`GridState::ensure_cursor_visible`] for a grid drawn at `area`,
    /// border included.
    pub fn ensure_visible_in(&mut self, area: Rect, model: &GridModel) {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        self.ensure_cursor_visible(
            inner.height.saturating_sub(1) as usize,
            inner.width.saturating_sub(MARKER_W),
            model,
        );
    }

    /// Map a terminal position inside `area` (the widget's full area, border
    /// included) to a header or body cell.
    pub fn hit_test(&self, area: Rect, model: &GridModel, x: u16, y: u16) -> Option<GridHit> {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        if !super::is_inside(x, y, inner) || x < inner.x + MARKER_W {
            return None;
        }

        let mut col_x = inner.x + MARKER_W;
        let mut col = None;
        for (idx, w) in model.col_widths.iter().enumerate().skip(self.col_offset) {
            let end = col_x.saturating_add(*w);
            if x < end {
                col = Some(idx);
                break;
            }
            col_x = end.saturating_add(1);
            if x < col_x {
                // On the padding between two columns.
                return None;
            }
        }
        let col = col?;

        if y == inner.y {
            return Some(GridHit::Header(col));
        }
        let row = self.row_offset + (y - inner.y - 1) as usize;
        (row < model.rows.len()).then_some(GridHit::Cell(CellRef::new(row, col)))
    }
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridHit {
    Header(usize),
    Cell(CellRef),
}

/// Display-ready copy of a page: headers with sort markers and cells already
/// converted to text.
#[derive(Debug, Clone, Default)]
pub struct GridModel {
    pub columns: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub col_widths: Vec<u16>,
}

impl GridModel {
    pub fn new(
        columns: &[String],
        rows: &[Vec<CellValue>],
        sort: Option<&SortSpec>,
        display: &DisplayConfig,
    ) -> Self {
        let headers: Vec<String> = columns
            .iter()
            .map(|c| match sort {
                Some(s) if &s.column == c => format!("{} {}", c, s.direction.arrow()),
                _ => c.clone(),
            })
            .collect();
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        CellValue::Null => display.null_indicator.clone(),
                        other => preview_cell(other, display.max_cell_width),
                    })
                    .collect()
            })
            .collect();
        let col_widths = compute_column_widths(
            &headers,
            &rows,
            display.min_column_width,
            display.max_column_width,
        );
        Self {
            columns: columns.to_vec(),
            headers,
            rows,
            col_widths,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

pub struct DataGrid<'a> {
    pub model: &'a GridModel,
    pub state: &'a GridState,
    pub title: &'a str,
    pub focused: bool,
}

impl<'a> Widget for DataGrid<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.model.headers.is_empty() {
            Paragraph::new("No data")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        if inner.height < 2 {
            Paragraph::new("Window too small")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let data_x = inner.x.saturating_add(MARKER_W);
        let data_w = inner.width.saturating_sub(MARKER_W);
        let body_rows = (inner.height - 1) as usize;

        let mut state = self.state.clone();
        state.ensure_cursor_visible(body_rows, data_w, self.model);

        buf.set_string(inner.x, inner.y, "  ", Style::default());
        render_row_cells(
            data_x,
            inner.y,
            data_w,
            &self.model.headers,
            &self.model.col_widths,
            state.col_offset,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            None,
            buf,
        );

        if self.model.rows.is_empty() {
            Paragraph::new("(no rows)")
                .style(Style::default().fg(Color::Gray))
                .render(
                    Rect {
                        y: inner.y + 1,
                        height: inner.height - 1,
                        ..inner
                    },
                    buf,
                );
            return;
        }

        for i in 0..body_rows {
            let row_idx = state.row_offset + i;
            let Some(row) = self.model.rows.get(row_idx) else {
                break;
            };
            let y = inner.y + 1 + i as u16;
            let is_cursor = row_idx == state.cursor_row;

            let row_style = if is_cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let marker = if is_cursor { "> " } else { "  " };
            buf.set_string(inner.x, y, marker, row_style.fg(Color::Cyan));

            let cursor_col = (is_cursor && self.focused).then_some(state.cursor_col);
            render_row_cells(
                data_x,
                y,
                data_w,
                row,
                &self.model.col_widths,
                state.col_offset,
                row_style,
                cursor_col,
                buf,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_row_cells(
    mut x: u16,
    y: u16,
    available_w: u16,
    cells: &[String],
    col_widths: &[u16],
    col_offset: usize,
    style: Style,
    highlight_col: Option<usize>,
    buf: &mut Buffer,
) {
    if available_w == 0 {
        return;
    }

    let max_x = x.saturating_add(available_w);

    let mut col = col_offset;
    while col < cells.len() && col < col_widths.len() && x < max_x {
        let w = col_widths[col];
        let draw_w = w.min(max_x - x);
        let cell_style = if highlight_col == Some(col) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            style
        };
        buf.set_string(x, y, fit_to_width(&cells[col], draw_w), cell_style);
        x += draw_w;

        if x < max_x {
            buf.set_string(x, y, " ", style);
            x += 1;
        }
        col += 1;
    }

    while x < max_x {
        buf.set_string(x, y, " ", style);
        x += 1;
    }
}

/// Total width of consecutive columns including the one-space gaps.
fn span_width(widths: &[u16]) -> u16 {
    let cells: u16 = widths.iter().fold(0u16, |acc, w| acc.saturating_add(*w));
    cells.saturating_add(widths.len().saturating_sub(1) as u16)
}

fn compute_column_widths(
    headers: &[String],
    rows: &[Vec<String>],
    min_w: u16,
    max_w: u16,
) -> Vec<u16> {
    let max_w = max_w.max(min_w);
    let mut widths: Vec<u16> = headers
        .iter()
        .map(|h| clamp_width(display_width(h), min_w, max_w))
        .collect();

    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(clamp_width(display_width(cell), min_w, max_w));
        }
    }

    widths
}

fn clamp_width(v: usize, min_v: u16, max_v: u16) -> u16 {
    (v.min(u16::MAX as usize) as u16).clamp(min_v, max_v)
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Pad or cut `s` to exactly `width` terminal columns. Line breaks are shown
/// as spaces so a cell never spills onto the next row.
fn fit_to_width(s: &str, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    let flat: String;
    let s = if s.contains(['\n', '\r', '\t']) {
        flat = s.replace(['\n', '\r', '\t'], " ");
        flat.as_str()
    } else {
        s
    };

    let current = display_width(s);
    if current <= width {
        let mut out = s.to_string();
        out.push_str(&" ".repeat(width - current));
        return out;
    }

    if width <= 3 {
        return truncate_by_display_width(s, width);
    }

    let mut out = truncate_by_display_width(s, width - 3);
    out.push_str("...");
    out
}

fn truncate_by_display_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }

    if used < width {
        out.push_str(&" ".repeat(width - used));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SortDirection;

    fn model() -> GridModel {
        let columns = vec!["id".to_string(), "name".to_string(), "note".to_string()];
        let rows = vec![
            vec![
                CellValue::Integer(1),
                CellValue::Text("Alice".into()),
                CellValue::Null,
            ],
            vec![
                CellValue::Integer(2),
                CellValue::Text("Bob".into()),
                CellValue::Text("x".repeat(80)),
            ],
        ];
        GridModel::new(&columns, &rows, None, &DisplayConfig::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_model_formats_cells() {
        let m = model();
        assert_eq!(m.rows[0], vec!["1", "Alice", "NULL"]);
        // min 3, header "name" is 4, "Alice" is 5, long note capped at 40.
        assert_eq!(m.col_widths, vec![3, 5, 40]);
    }

    #[test]
    fn test_sort_arrow_in_header() {
        let sort = SortSpec {
            column: "name".into(),
            direction: SortDirection::Desc,
        };
        let m = GridModel::new(
            &["id".to_string(), "name".to_string()],
            &[],
            Some(&sort),
            &DisplayConfig::default(),
        );
        assert_eq!(m.headers, vec!["id", "name ↓"]);
        assert_eq!(m.columns, vec!["id", "name"]);
    }

    #[test]
    fn test_cursor_moves_and_clamps() {
        let m = model();
        let mut s = GridState::default();
        assert!(!s.handle_key(key(KeyCode::Up), &m));
        assert!(s.handle_key(key(KeyCode::Down), &m));
        assert!(!s.handle_key(key(KeyCode::Down), &m));
        assert_eq!(s.cursor_row, 1);
        assert!(s.handle_key(key(KeyCode::Char('$')), &m));
        assert_eq!(s.cursor(), CellRef::new(1, 2));
        assert!(!s.handle_key(key(KeyCode::Right), &m));
    }

    #[test]
    fn test_horizontal_scroll_follows_cursor() {
        let m = model();
        let mut s = GridState {
            cursor_col: 2,
            ..Default::default()
        };
        // 3 + 1 + 5 + 1 + 40 = 50 columns needed to show all three, 46 for the last two.
        s.ensure_cursor_visible(10, 46, &m);
        assert_eq!(s.col_offset, 1);
        s.ensure_cursor_visible(10, 50, &m);
        assert_eq!(s.col_offset, 1);
        s.cursor_col = 0;
        s.ensure_cursor_visible(10, 50, &m);
        assert_eq!(s.col_offset, 0);
    }

    #[test]
    fn test_vertical_scroll_follows_cursor() {
        let rows: Vec<Vec<CellValue>> = (0..20).map(|i| vec![CellValue::Integer(i)]).collect();
        let m = GridModel::new(&["n".to_string()], &rows, None, &DisplayConfig::default());
        let mut s = GridState {
            cursor_row: 15,
            ..Default::default()
        };
        s.ensure_cursor_visible(5, 20, &m);
        assert_eq!(s.row_offset, 11);
        s.cursor_row = 3;
        s.ensure_cursor_visible(5, 20, &m);
        assert_eq!(s.row_offset, 3);
    }

    #[test]
    fn test_hit_test() {
        let m = model();
        let s = GridState::default();
        let area = Rect::new(0, 0, 60, 10);
        // Border at x=0, marker at 1..3, "id" column at 3..6, gap at 6, "name" at 7..12.
        assert_eq!(s.hit_test(area, &m, 4, 1), Some(GridHit::Header(0)));
        assert_eq!(s.hit_test(area, &m, 8, 1), Some(GridHit::Header(1)));
        assert_eq!(s.hit_test(area, &m, 8, 3), Some(GridHit::Cell(CellRef::new(1, 1))));
        assert_eq!(s.hit_test(area, &m, 6, 2), None);
        assert_eq!(s.hit_test(area, &m, 1, 2), None);
        // Below the last row.
        assert_eq!(s.hit_test(area, &m, 4, 6), None);
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("abcdefgh", 6), "abc...");
        assert_eq!(fit_to_width("a\nb", 3), "a b");
        assert_eq!(fit_to_width("日本語", 5), "日...");
    }

    #[test]
    fn test_render_marks_cursor_cell() {
        let m = model();
        let s = GridState::default();
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        DataGrid {
            model: &m,
            state: &s,
            title: " Data ",
            focused: true,
        }
        .render(area, &mut buf);

        let text = super::super::buffer_text(&buf);
        assert!(text.contains("Data"));
        assert!(text.contains("> 1"));
        assert_eq!(buf[(3, 2)].bg, Color::Cyan);
    }
}
