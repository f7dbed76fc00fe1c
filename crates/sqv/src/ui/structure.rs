//! Database Structure view: schema tree on the left, definition on the right.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tui_tree_widget::{Tree, TreeItem, TreeState};

use super::is_inside;
use crate::schema_tree::NodeId;

#[derive(Default)]
pub struct StructurePane {
    pub items: Vec<TreeItem<'static, NodeId>>,
    pub state: TreeState<NodeId>,
    pub detail: String,
    detail_scroll: u16,
    /// Areas from the last render, for mouse hit-testing.
    tree_area: Option<Rect>,
    detail_area: Option<Rect>,
}

impl StructurePane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree contents. The selection is reset to the first node.
    pub fn set_items(&mut self, items: Vec<TreeItem<'static, NodeId>>) {
        self.state = TreeState::default();
        if let Some(first) = items.first() {
            self.state.select(vec![first.identifier().clone()]);
        }
        self.items = items;
        self.set_detail(String::new());
    }

    pub fn set_detail(&mut self, text: String) {
        self.detail = text;
        self.detail_scroll = 0;
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.state.selected().last().cloned()
    }

    /// Tree navigation keys. Returns true when the selection may have changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => self.state.key_up(),
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                self.state.key_down()
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                self.state.key_left()
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                self.state.key_right()
            }
            (KeyCode::Enter, _) | (KeyCode::Char(' '), KeyModifiers::NONE) => {
                self.state.toggle_selected()
            }
            (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                self.state.select_first()
            }
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => self.state.select_last(),
            _ => false,
        }
    }

    /// Detail pane scrolling.
    pub fn scroll_detail(&mut self, delta: i32) {
        let max = self.detail.lines().count().saturating_sub(1) as i32;
        self.detail_scroll = (self.detail_scroll as i32 + delta).clamp(0, max.max(0)) as u16;
    }

    /// Select the tree row under a click, toggling it when it was already
    /// selected. Returns true when the click landed on the tree.
    pub fn click(&mut self, x: u16, y: u16) -> bool {
        if !self.tree_area.is_some_and(|a| is_inside(x, y, a)) {
            return false;
        }
        // Rows are resolved against the last render, scroll offset included.
        self.state.click_at(Position::new(x, y));
        true
    }

    pub fn scroll_wheel(&mut self, x: u16, y: u16, down: bool) -> bool {
        if self.tree_area.is_some_and(|a| is_inside(x, y, a)) {
            if down {
                self.state.key_down();
            } else {
                self.state.key_up();
            }
            return true;
        }
        if self.detail_area.is_some_and(|a| is_inside(x, y, a)) {
            self.scroll_detail(if down { 1 } else { -1 });
        }
        false
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, detail_focused: bool) {
        let [tree_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
                .areas(area);
        self.tree_area = Some(tree_area);
        self.detail_area = Some(detail_area);

        let (tree_border, detail_border) = if detail_focused {
            (Color::DarkGray, Color::Cyan)
        } else {
            (Color::Cyan, Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Schema ")
            .border_style(Style::default().fg(tree_border));

        if self.items.is_empty() {
            frame.render_widget(
                Paragraph::new("No schema objects")
                    .block(block)
                    .style(Style::default().fg(Color::DarkGray)),
                tree_area,
            );
        } else {
            match Tree::new(&self.items) {
                Ok(tree) => {
                    let tree = tree
                        .block(block)
                        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
                        .highlight_symbol("▶ ");
                    frame.render_stateful_widget(tree, tree_area, &mut self.state);
                }
                Err(e) => {
                    frame.render_widget(
                        Paragraph::new(format!("Error: {}", e))
                            .block(block)
                            .style(Style::default().fg(Color::Red)),
                        tree_area,
                    );
                }
            }
        }

        let detail = Paragraph::new(self.detail.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Definition ")
                    .border_style(Style::default().fg(detail_border)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.detail_scroll, 0));
        frame.render_widget(detail, detail_area);
    }
}
