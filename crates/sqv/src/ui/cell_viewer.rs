//! Modal showing the full value of one cell.
//!
//! Unlike the grid, nothing is truncated: JSON is re-indented and blobs are
//! shown as a hex dump.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use super::centered_rect;
use crate::db::CellValue;
use crate::format::{full_value, FullValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellViewerAction {
    Continue,
    Close,
    /// Copy the displayed text to the clipboard.
    Copy(String),
}

pub struct CellViewer {
    column: String,
    value: FullValue,
    line_count: usize,
    scroll_offset: usize,
    visible_height: usize,
}

impl CellViewer {
    pub fn new(column: impl Into<String>, value: &CellValue) -> Self {
        let value = full_value(value);
        let line_count = value.text.lines().count().max(1);
        Self {
            column: column.into(),
            value,
            line_count,
            scroll_offset: 0,
            visible_height: 10,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn text(&self) -> &str {
        &self.value.text
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> CellViewerAction {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::NONE) => {
                CellViewerAction::Close
            }
            (KeyCode::Char('y'), KeyModifiers::NONE) => {
                CellViewerAction::Copy(self.value.text.clone())
            }
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                self.scroll_down(1);
                CellViewerAction::Continue
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
                self.scroll_up(1);
                CellViewerAction::Continue
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                self.scroll_down(self.visible_height / 2);
                CellViewerAction::Continue
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.scroll_up(self.visible_height / 2);
                CellViewerAction::Continue
            }
            (KeyCode::PageDown, _) => {
                self.scroll_down(self.visible_height.saturating_sub(1));
                CellViewerAction::Continue
            }
            (KeyCode::PageUp, _) => {
                self.scroll_up(self.visible_height.saturating_sub(1));
                CellViewerAction::Continue
            }
            (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                self.scroll_offset = 0;
                CellViewerAction::Continue
            }
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
                self.scroll_offset = self.max_scroll();
                CellViewerAction::Continue
            }
            _ => CellViewerAction::Continue,
        }
    }

    fn max_scroll(&self) -> usize {
        self.line_count.saturating_sub(self.visible_height)
    }

    fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.max_scroll());
    }

    fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (area.width as usize * 80 / 100) as u16;
        let height = (area.height as usize * 80 / 100) as u16;
        let modal = centered_rect(width, height, area);
        frame.render_widget(Clear, modal);

        let mut title = vec![Span::styled(
            format!(" Column: {} ", self.column),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if self.value.is_json {
            title.push(Span::styled("[JSON] ", Style::default().fg(Color::Magenta)));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(title))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        let content_area = chunks[0];

        self.visible_height = content_area.height as usize;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());

        let text_style = if self.value.is_json {
            Style::default().fg(Color::LightGreen)
        } else {
            Style::default()
        };
        let lines: Vec<Line> = self
            .value
            .text
            .lines()
            .skip(self.scroll_offset)
            .take(self.visible_height)
            .map(|l| Line::from(Span::styled(l.to_string(), text_style)))
            .collect();
        frame.render_widget(Paragraph::new(lines), content_area);

        let footer = Line::from(vec![
            Span::styled(" j/k ", Style::default().fg(Color::Yellow)),
            Span::styled("scroll  ", Style::default().fg(Color::DarkGray)),
            Span::styled("y ", Style::default().fg(Color::Yellow)),
            Span::styled("copy  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q/Esc ", Style::default().fg(Color::Yellow)),
            Span::styled("close  ", Style::default().fg(Color::DarkGray)),
            Span::raw(" ".repeat(chunks[1].width.saturating_sub(44) as usize)),
            Span::styled(
                format!(
                    "{}/{}",
                    (self.scroll_offset + self.visible_height).min(self.line_count),
                    self.line_count
                ),
                Style::default().fg(Color::Cyan),
            ),
        ]);
        frame.render_widget(Paragraph::new(footer), chunks[1]);

        if self.line_count > self.visible_height {
            let mut state = ScrollbarState::new(self.max_scroll()).position(self.scroll_offset);
            let bar = Rect {
                x: content_area.x + content_area.width.saturating_sub(1),
                width: 1,
                ..content_area
            };
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("▲"))
                    .end_symbol(Some("▼")),
                bar,
                &mut state,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_close_and_copy() {
        let mut viewer = CellViewer::new("name", &CellValue::Text("Alice".into()));
        assert_eq!(viewer.handle_key(key(KeyCode::Esc)), CellViewerAction::Close);
        assert_eq!(viewer.handle_key(key(KeyCode::Char('q'))), CellViewerAction::Close);
        assert_eq!(
            viewer.handle_key(key(KeyCode::Char('y'))),
            CellViewerAction::Copy("Alice".into())
        );
    }

    #[test]
    fn test_scrolling_is_bounded() {
        let long: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let mut viewer = CellViewer::new("notes", &CellValue::Text(long));
        viewer.visible_height = 10;
        viewer.handle_key(key(KeyCode::Char('k')));
        assert_eq!(viewer.scroll_offset, 0);
        viewer.handle_key(key(KeyCode::Char('G')));
        assert_eq!(viewer.scroll_offset, 40);
        viewer.handle_key(key(KeyCode::Char('j')));
        assert_eq!(viewer.scroll_offset, 40);
        viewer.handle_key(key(KeyCode::Char('g')));
        assert_eq!(viewer.scroll_offset, 0);
    }

    #[test]
    fn test_blob_shows_hex_dump() {
        let viewer = CellViewer::new("data", &CellValue::Blob(b"[test]".to_vec()));
        assert!(viewer.text().starts_with("BLOB (6 bytes)"));
        assert!(viewer.text().contains("5B 74 65 73 74 5D"));
    }

    #[test]
    fn test_render_title_and_json() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut viewer = CellViewer::new("payload", &CellValue::Text(r#"{"a":1}"#.into()));
        terminal.draw(|f| viewer.render(f, f.area())).unwrap();

        let text = super::super::buffer_text(terminal.backend().buffer());
        assert!(text.contains("Column: payload"));
        assert!(text.contains("[JSON]"));
        assert!(text.contains("\"a\": 1"));
    }

    #[test]
    fn test_render_on_very_wide_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(1000, 30)).unwrap();
        let mut viewer = CellViewer::new("name", &CellValue::Text("Alice".into()));
        terminal.draw(|f| viewer.render(f, f.area())).unwrap();

        let text = super::super::buffer_text(terminal.backend().buffer());
        assert!(text.contains("Column: name"));
    }
}
