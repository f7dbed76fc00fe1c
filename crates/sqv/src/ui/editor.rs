use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Color, Modifier, Style};
use tui_textarea::{CursorMove, Input, TextArea};

fn fresh_textarea(lines: Vec<String>) -> TextArea<'static> {
    let mut textarea = TextArea::new(lines);
    textarea.set_cursor_line_style(Style::default().add_modifier(Modifier::UNDERLINED));
    textarea
}

/// Single-line input used for the `:` prompt and the browse filter.
pub struct LineInput {
    pub active: bool,
    pub textarea: TextArea<'static>,
    placeholder: &'static str,
}

impl LineInput {
    pub fn new(placeholder: &'static str) -> Self {
        let mut input = Self {
            active: false,
            textarea: fresh_textarea(vec![String::new()]),
            placeholder,
        };
        input.apply_placeholder();
        input
    }

    fn apply_placeholder(&mut self) {
        self.textarea.set_placeholder_text(self.placeholder);
        self.textarea
            .set_placeholder_style(Style::default().fg(Color::DarkGray));
    }

    /// Start editing with `initial` as the current text.
    pub fn open(&mut self, initial: &str) {
        self.active = true;
        self.textarea = fresh_textarea(vec![initial.to_string()]);
        self.textarea.move_cursor(CursorMove::End);
        self.apply_placeholder();
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    pub fn clear(&mut self) {
        self.textarea = fresh_textarea(vec![String::new()]);
        self.apply_placeholder();
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("")
    }

    /// Feed a key to the input. Enter and newlines are left to the caller.
    pub fn input(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            return;
        }
        let input: Input = key.into();
        self.textarea.input(input);
    }
}

/// Multi-line SQL editor of the Execute SQL view.
pub struct QueryEditor {
    pub textarea: TextArea<'static>,
}

impl QueryEditor {
    pub fn new() -> Self {
        Self {
            textarea: fresh_textarea(vec![String::new()]),
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_text(&mut self, s: &str) {
        let lines: Vec<String> = if s.is_empty() {
            vec![String::new()]
        } else {
            s.lines().map(|l| l.to_string()).collect()
        };
        self.textarea = fresh_textarea(lines);
    }

    pub fn input(&mut self, key: KeyEvent) {
        let input: Input = key.into();
        self.textarea.input(input);
    }
}

impl Default for QueryEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_line_input_ignores_enter() {
        let mut input = LineInput::new("filter");
        input.open("id");
        input.input(key(KeyCode::Char(' ')));
        input.input(key(KeyCode::Char('>')));
        input.input(key(KeyCode::Enter));
        input.input(key(KeyCode::Char('1')));
        assert_eq!(input.text(), "id >1");
        assert_eq!(input.textarea.lines().len(), 1);
    }

    #[test]
    fn test_line_input_open_replaces_text() {
        let mut input = LineInput::new("");
        input.open("first");
        input.close();
        input.open("second");
        assert!(input.active);
        assert_eq!(input.text(), "second");
        input.clear();
        assert_eq!(input.text(), "");
    }

    #[test]
    fn test_query_editor_round_trips_lines() {
        let mut editor = QueryEditor::new();
        editor.set_text("SELECT *\nFROM users;");
        assert_eq!(editor.text(), "SELECT *\nFROM users;");
        editor.set_text("");
        assert_eq!(editor.text(), "");
    }
}
