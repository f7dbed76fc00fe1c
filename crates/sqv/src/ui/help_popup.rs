//! Keybinding reference shown with `?`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use super::centered_rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpAction {
    Continue,
    Close,
}

/// A single keybinding entry.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    pub const fn new(keys: &'static str, description: &'static str) -> Self {
        Self { keys, description }
    }
}

#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: &'static str,
    pub bindings: &'static [KeyBinding],
}

impl HelpSection {
    pub const fn new(title: &'static str, bindings: &'static [KeyBinding]) -> Self {
        Self { title, bindings }
    }
}

const NAVIGATION: HelpSection = HelpSection::new(
    "Navigation",
    &[
        KeyBinding::new("d", "Database Structure view"),
        KeyBinding::new("b", "Browse Data view"),
        KeyBinding::new("e", "Execute SQL view"),
        KeyBinding::new("Tab", "Cycle focus within the view"),
        KeyBinding::new(":", "Command prompt"),
        KeyBinding::new("?", "Toggle this help"),
        KeyBinding::new("q / Ctrl+Q", "Quit"),
    ],
);

const STRUCTURE: HelpSection = HelpSection::new(
    "Database Structure",
    &[
        KeyBinding::new("j/k, Up/Down", "Move in the tree"),
        KeyBinding::new("h/l, Left/Right", "Collapse / expand"),
        KeyBinding::new("Enter", "Toggle node"),
        KeyBinding::new("r", "Reload schema"),
    ],
);

const BROWSE: HelpSection = HelpSection::new(
    "Browse Data",
    &[
        KeyBinding::new("t", "Pick a table"),
        KeyBinding::new("/", "Edit WHERE filter (Enter applies)"),
        KeyBinding::new("Ctrl+L", "Clear filter"),
        KeyBinding::new("PgUp/PgDn", "Previous / next page"),
        KeyBinding::new("Home/End", "First / last page"),
        KeyBinding::new("Arrows, h/j/k/l", "Move between cells"),
        KeyBinding::new("s", "Sort by current column (again to flip)"),
        KeyBinding::new("Enter", "View cell contents"),
        KeyBinding::new("Click header", "Sort by that column"),
    ],
);

const EXECUTE: HelpSection = HelpSection::new(
    "Execute SQL",
    &[
        KeyBinding::new("F5, Ctrl+Enter, Ctrl+R", "Execute query"),
        KeyBinding::new("Esc / i", "Leave / return to the editor"),
        KeyBinding::new("Ctrl+T", "New query tab"),
        KeyBinding::new("Ctrl+W", "Close query tab"),
        KeyBinding::new("Alt+1-5", "Switch query tabs"),
        KeyBinding::new("Ctrl+E", "Export results"),
        KeyBinding::new("Ctrl+Y", "Copy query to clipboard"),
        KeyBinding::new("PgUp/PgDn", "Navigate result pages"),
        KeyBinding::new("Enter", "View cell contents"),
    ],
);

const COMMANDS: HelpSection = HelpSection::new(
    "Commands",
    &[
        KeyBinding::new(":export csv|json [path]", "Export current results"),
        KeyBinding::new(":tab new", "Open a query tab"),
        KeyBinding::new(":tab close", "Close the active query tab"),
        KeyBinding::new(":help", "Show this help"),
        KeyBinding::new(":q", "Quit"),
    ],
);

const CELL_VIEWER: HelpSection = HelpSection::new(
    "Cell Viewer",
    &[
        KeyBinding::new("j/k", "Scroll"),
        KeyBinding::new("y", "Copy value"),
        KeyBinding::new("q / Esc", "Close viewer"),
    ],
);

const ALL_SECTIONS: &[HelpSection] = &[
    NAVIGATION,
    STRUCTURE,
    BROWSE,
    EXECUTE,
    COMMANDS,
    CELL_VIEWER,
];

pub struct HelpPopup {
    sections: &'static [HelpSection],
    scroll_offset: usize,
    total_lines: usize,
    visible_height: usize,
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPopup {
    pub fn new() -> Self {
        Self {
            sections: ALL_SECTIONS,
            scroll_offset: 0,
            total_lines: total_lines(ALL_SECTIONS),
            visible_height: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> HelpAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => HelpAction::Close,
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_by(1);
                HelpAction::Continue
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_by(-1);
                HelpAction::Continue
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_by((self.visible_height / 2) as isize);
                HelpAction::Continue
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_by(-((self.visible_height / 2) as isize));
                HelpAction::Continue
            }
            KeyCode::PageDown => {
                self.scroll_by(self.visible_height.saturating_sub(2) as isize);
                HelpAction::Continue
            }
            KeyCode::PageUp => {
                self.scroll_by(-(self.visible_height.saturating_sub(2) as isize));
                HelpAction::Continue
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.scroll_offset = 0;
                HelpAction::Continue
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.scroll_offset = self.max_scroll();
                HelpAction::Continue
            }
            _ => HelpAction::Continue,
        }
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height)
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let next = self.scroll_offset.saturating_add_signed(delta);
        self.scroll_offset = next.min(self.max_scroll());
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (area.width as usize * 80 / 100).clamp(60, 90) as u16;
        let height = (area.height as usize * 85 / 100).clamp(20, 50) as u16;
        let popup = centered_rect(width, height, area);

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Help ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

        let header = Line::from(vec![
            Span::styled(
                "sqv",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" - SQLite Viewer v{}  ", env!("CARGO_PKG_VERSION"))),
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(header), chunks[0]);
        frame.render_widget(
            Paragraph::new("─".repeat(chunks[1].width as usize))
                .style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );

        self.visible_height = chunks[2].height as usize;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());

        let lines: Vec<Line> = self
            .lines(chunks[2].width as usize)
            .into_iter()
            .skip(self.scroll_offset)
            .take(self.visible_height)
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[2]);

        let position = if self.total_lines > self.visible_height {
            let shown = self.scroll_offset + self.visible_height;
            let pct = (shown * 100 / self.total_lines).min(100);
            format!("{}%", pct)
        } else {
            "All".to_string()
        };
        let footer = Line::from(vec![
            Span::styled(" j/k ", Style::default().fg(Color::Yellow)),
            Span::styled("scroll  ", Style::default().fg(Color::DarkGray)),
            Span::styled(" g/G ", Style::default().fg(Color::Yellow)),
            Span::styled("top/bottom  ", Style::default().fg(Color::DarkGray)),
            Span::raw(" ".repeat(chunks[3].width.saturating_sub(36) as usize)),
            Span::styled(position, Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(footer), chunks[3]);

        if self.total_lines > self.visible_height {
            let mut state = ScrollbarState::new(self.max_scroll()).position(self.scroll_offset);
            let bar_area = Rect {
                x: chunks[2].x + chunks[2].width.saturating_sub(1),
                width: 1,
                ..chunks[2]
            };
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("▲"))
                    .end_symbol(Some("▼")),
                bar_area,
                &mut state,
            );
        }
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(self.total_lines);
        for (idx, section) in self.sections.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!(" {} ", section.title),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "─".repeat(width),
                Style::default().fg(Color::DarkGray),
            )));
            for binding in section.bindings {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<26}", binding.keys),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(binding.description),
                ]));
            }
            if idx + 1 < self.sections.len() {
                lines.push(Line::from(""));
            }
        }
        lines
    }
}

fn total_lines(sections: &[HelpSection]) -> usize {
    let body: usize = sections.iter().map(|s| 2 + s.bindings.len()).sum();
    body + sections.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_close_keys() {
        let mut help = HelpPopup::new();
        assert_eq!(help.handle_key(key(KeyCode::Esc)), HelpAction::Close);
        assert_eq!(help.handle_key(key(KeyCode::Char('?'))), HelpAction::Close);
        assert_eq!(help.handle_key(key(KeyCode::Char('j'))), HelpAction::Continue);
    }

    #[test]
    fn test_line_count_matches_rendered_lines() {
        let help = HelpPopup::new();
        assert_eq!(help.lines(40).len(), help.total_lines);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut help = HelpPopup::new();
        help.visible_height = 10;
        help.handle_key(key(KeyCode::Char('k')));
        assert_eq!(help.scroll_offset, 0);
        help.handle_key(key(KeyCode::Char('G')));
        assert_eq!(help.scroll_offset, help.total_lines - 10);
        help.handle_key(key(KeyCode::Char('j')));
        assert_eq!(help.scroll_offset, help.total_lines - 10);
    }

    #[test]
    fn test_render_shows_sections() {
        let backend = TestBackend::new(100, 60);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut help = HelpPopup::new();
        terminal.draw(|f| help.render(f, f.area())).unwrap();

        let text = super::super::buffer_text(terminal.backend().buffer());
        assert!(text.contains("Navigation"));
        assert!(text.contains("Browse Data"));
        assert!(text.contains("Execute query"));
    }

    #[test]
    fn test_render_on_very_wide_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(1000, 60)).unwrap();
        let mut help = HelpPopup::new();
        terminal.draw(|f| help.render(f, f.area())).unwrap();

        let text = super::super::buffer_text(terminal.backend().buffer());
        assert!(text.contains("Navigation"));
    }
}
