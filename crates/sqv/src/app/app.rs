use std::io::Stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tui_textarea::TextArea;
use unicode_width::UnicodeWidthStr;

use super::state::{BrowseFocus, NavButton, SqlFocus, StructureFocus, View};
use crate::browse::BrowseState;
use crate::config::Config;
use crate::db::Database;
use crate::error::ExportError;
use crate::export::{self, ExportFormat};
use crate::inspect::{CellInspector, CellRef};
use crate::pager::Pager;
use crate::schema_tree::{self, SchemaTree};
use crate::tabs::Tabs;
use crate::ui::{
    is_inside, CellViewer, CellViewerAction, DataGrid, GridHit, GridModel, GridState, HelpAction,
    HelpPopup, LineInput, QueryEditor, StructurePane,
};

const FILTER_PLACEHOLDER: &str = "WHERE clause (e.g., id > 10)";

/// Rects from the last frame, used to route mouse clicks.
#[derive(Default)]
struct HitAreas {
    views: Vec<(Rect, View)>,
    query_tabs: Vec<(Rect, usize)>,
    nav: Vec<(Rect, NavButton)>,
    tables: Option<Rect>,
    filter: Option<Rect>,
    editor: Option<Rect>,
    grid: Option<Rect>,
}

pub struct App {
    db: Database,
    config: Config,
    pub view: View,

    schema: SchemaTree,
    structure: StructurePane,
    structure_focus: StructureFocus,

    browse: BrowseState,
    browse_focus: BrowseFocus,
    table_list: ListState,
    filter: LineInput,
    browse_grid: GridModel,
    browse_grid_state: GridState,

    tabs: Tabs,
    editor: QueryEditor,
    sql_focus: SqlFocus,
    sql_grid: GridModel,
    sql_grid_state: GridState,

    inspector: CellInspector,
    cell_viewer: Option<CellViewer>,
    help: Option<HelpPopup>,
    command: LineInput,

    areas: HitAreas,
    pub last_status: Option<String>,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(db: Database, config: Config) -> Self {
        let page_size = config.display.page_size.max(1);
        let tabs = Tabs::new(config.sql.max_tabs, page_size, &config.sql.default_query);
        let mut editor = QueryEditor::new();
        editor.set_text(&tabs.active().query);

        let mut app = Self {
            db,
            view: View::Structure,

            schema: SchemaTree::default(),
            structure: StructurePane::new(),
            structure_focus: StructureFocus::Tree,

            browse: BrowseState::new(page_size),
            browse_focus: BrowseFocus::Tables,
            table_list: ListState::default(),
            filter: LineInput::new(FILTER_PLACEHOLDER),
            browse_grid: GridModel::empty(),
            browse_grid_state: GridState::default(),

            tabs,
            editor,
            sql_focus: SqlFocus::Editor,
            sql_grid: GridModel::empty(),
            sql_grid_state: GridState::default(),

            inspector: CellInspector::new(config.inspect.policy()),
            cell_viewer: None,
            help: None,
            command: LineInput::new(""),

            areas: HitAreas::default(),
            last_status: None,
            last_error: None,
            config,
        };
        app.reload_schema();
        app
    }

    /// Give the connection back so the caller can close it.
    pub fn into_database(self) -> Database {
        self.db
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.on_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.on_mouse(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Keyboard
    // ---------------------------------------------------------------------

    /// Handle one key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::CONTROL {
            return true;
        }

        if let Some(viewer) = self.cell_viewer.as_mut() {
            match viewer.handle_key(key) {
                CellViewerAction::Close => self.cell_viewer = None,
                CellViewerAction::Copy(text) => self.copy_to_clipboard(&text),
                CellViewerAction::Continue => {}
            }
            return false;
        }

        if let Some(help) = self.help.as_mut() {
            if help.handle_key(key) == HelpAction::Close {
                self.help = None;
            }
            return false;
        }

        if self.command.active {
            return self.handle_command_key(key);
        }

        if self.last_error.is_some()
            && matches!(key.code, KeyCode::Esc | KeyCode::Enter)
            && key.modifiers == KeyModifiers::NONE
        {
            self.last_error = None;
            return false;
        }

        if self.in_text_input() {
            match self.view {
                View::Browse => self.handle_filter_key(key),
                _ => self.handle_sql_key(key),
            }
            return false;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
            (KeyCode::Char('?'), _) => {
                self.help = Some(HelpPopup::new());
                return false;
            }
            (KeyCode::Char(':'), _) => {
                self.command.open("");
                return false;
            }
            (KeyCode::Char(c), KeyModifiers::NONE) if View::from_key(c).is_some() => {
                if let Some(view) = View::from_key(c) {
                    self.set_view(view);
                }
                return false;
            }
            _ => {}
        }

        match self.view {
            View::Structure => self.handle_structure_key(key),
            View::Browse => self.handle_browse_key(key),
            View::Sql => self.handle_sql_key(key),
        }
        false
    }

    /// Whether keys are currently being typed into a text field.
    fn in_text_input(&self) -> bool {
        match self.view {
            View::Browse => self.browse_focus == BrowseFocus::Filter,
            View::Sql => self.sql_focus == SqlFocus::Editor,
            View::Structure => false,
        }
    }

    pub fn set_view(&mut self, view: View) {
        if self.view != view {
            tracing::debug!(view = view.label(), "switched view");
        }
        self.view = view;
        self.last_status = None;
        if view == View::Browse && self.browse.table().is_none() {
            self.browse_focus = BrowseFocus::Tables;
        }
    }

    fn handle_structure_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) => {
                self.structure_focus = match self.structure_focus {
                    StructureFocus::Tree => StructureFocus::Detail,
                    StructureFocus::Detail => StructureFocus::Tree,
                };
            }
            (KeyCode::Char('r'), KeyModifiers::NONE) => {
                self.reload_schema();
                self.last_status = Some("Schema reloaded".to_string());
            }
            _ => match self.structure_focus {
                StructureFocus::Tree => {
                    if self.structure.handle_key(key) {
                        self.refresh_definition();
                    }
                }
                StructureFocus::Detail => match key.code {
                    KeyCode::Char('j') | KeyCode::Down => self.structure.scroll_detail(1),
                    KeyCode::Char('k') | KeyCode::Up => self.structure.scroll_detail(-1),
                    KeyCode::PageDown => self.structure.scroll_detail(10),
                    KeyCode::PageUp => self.structure.scroll_detail(-10),
                    _ => {}
                },
            },
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) => {
                self.browse_focus = match self.browse_focus {
                    BrowseFocus::Tables => BrowseFocus::Grid,
                    _ => BrowseFocus::Tables,
                };
                return;
            }
            (KeyCode::Char('t'), KeyModifiers::NONE) => {
                self.browse_focus = BrowseFocus::Tables;
                return;
            }
            (KeyCode::Char('/'), _) => {
                if self.browse.table().is_some() {
                    self.filter.open(self.browse.filter().unwrap_or(""));
                    self.browse_focus = BrowseFocus::Filter;
                } else {
                    self.last_status = Some("Select a table first".to_string());
                }
                return;
            }
            (KeyCode::Char('l'), KeyModifiers::CONTROL) => {
                self.clear_browse_filter();
                return;
            }
            (KeyCode::PageDown, _) => return self.press_nav(NavButton::Next),
            (KeyCode::PageUp, _) => return self.press_nav(NavButton::Prev),
            (KeyCode::Home, _) => return self.press_nav(NavButton::First),
            (KeyCode::End, _) => return self.press_nav(NavButton::Last),
            _ => {}
        }

        match self.browse_focus {
            BrowseFocus::Tables => {
                let count = self.schema.table_names().len();
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                        let next = self.table_list.selected().map_or(0, |i| (i + 1).min(count - 1));
                        self.table_list.select(Some(next));
                    }
                    KeyCode::Char('k') | KeyCode::Up if count > 0 => {
                        let prev = self.table_list.selected().map_or(0, |i| i.saturating_sub(1));
                        self.table_list.select(Some(prev));
                    }
                    KeyCode::Enter => {
                        let name = self
                            .table_list
                            .selected()
                            .and_then(|i| self.schema.table_names().get(i).map(|s| s.to_string()));
                        if let Some(name) = name {
                            self.open_table(&name);
                        }
                    }
                    _ => {}
                }
            }
            BrowseFocus::Grid => match (key.code, key.modifiers) {
                (KeyCode::Char('s'), KeyModifiers::NONE) => {
                    self.sort_browse(self.browse_grid_state.cursor_col);
                }
                (KeyCode::Enter, _) => self.confirm_cell(),
                _ => {
                    if self.browse_grid_state.handle_key(key, &self.browse_grid) {
                        self.inspector.highlight(self.browse_grid_state.cursor());
                    }
                }
            },
            BrowseFocus::Filter => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => {
                let text = self.filter.text();
                self.filter.close();
                self.browse_focus = BrowseFocus::Grid;
                self.browse.apply_filter(&text);
                tracing::info!(filter = %text, "applied filter");
                self.load_browse();
            }
            (KeyCode::Esc, _) => {
                // Drop the edit and show the active filter again.
                self.filter.open(self.browse.filter().unwrap_or(""));
                self.filter.close();
                self.browse_focus = BrowseFocus::Grid;
            }
            (KeyCode::Char('l'), KeyModifiers::CONTROL) => {
                self.filter.close();
                self.browse_focus = BrowseFocus::Grid;
                self.clear_browse_filter();
            }
            _ => self.filter.input(key),
        }
    }

    fn handle_sql_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::F(5), _)
            | (KeyCode::Enter, KeyModifiers::CONTROL)
            | (KeyCode::Char('r'), KeyModifiers::CONTROL) => return self.run_query(),
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => return self.new_tab(),
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => return self.close_tab(),
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                let prompt = format!("export {} ", self.config.export.default_format);
                self.command.open(&prompt);
                return;
            }
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => {
                let text = self.editor.text();
                self.copy_to_clipboard(&text);
                return;
            }
            (KeyCode::Char(c), KeyModifiers::ALT) if c.is_ascii_digit() && c != '0' => {
                let index = c as usize - '1' as usize;
                return self.switch_tab(index);
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.sql_focus = match self.sql_focus {
                    SqlFocus::Editor => SqlFocus::Results,
                    SqlFocus::Results => SqlFocus::Editor,
                };
                return;
            }
            _ => {}
        }

        match self.sql_focus {
            SqlFocus::Editor => {
                if key.code == KeyCode::Esc {
                    self.sql_focus = SqlFocus::Results;
                } else {
                    self.editor.input(key);
                }
            }
            SqlFocus::Results => match (key.code, key.modifiers) {
                (KeyCode::Char('i'), KeyModifiers::NONE) => self.sql_focus = SqlFocus::Editor,
                (KeyCode::PageDown, _) => self.press_nav(NavButton::Next),
                (KeyCode::PageUp, _) => self.press_nav(NavButton::Prev),
                (KeyCode::Home, _) => self.press_nav(NavButton::First),
                (KeyCode::End, _) => self.press_nav(NavButton::Last),
                (KeyCode::Enter, _) => self.confirm_cell(),
                _ => {
                    if self.sql_grid_state.handle_key(key, &self.sql_grid) {
                        self.inspector.highlight(self.sql_grid_state.cursor());
                    }
                }
            },
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => {
                let cmd = self.command.text();
                self.command.close();
                return self.execute_command(cmd.trim());
            }
            KeyCode::Esc => self.command.close(),
            _ => self.command.input(key),
        }
        false
    }

    /// Run a `:` command. Returns true when the command asks to quit.
    fn execute_command(&mut self, cmd: &str) -> bool {
        if cmd.is_empty() {
            return false;
        }

        let Some(parts) = shlex::split(cmd) else {
            self.last_error = Some(format!("Invalid command: {}", cmd));
            return false;
        };
        let Some((command, args)) = parts.split_first() else {
            return false;
        };

        match command.as_str() {
            "q" | "quit" | "exit" => return true,
            "help" | "h" => self.help = Some(HelpPopup::new()),
            "export" => self.handle_export_command(args),
            "tab" => match args.first().map(String::as_str) {
                Some("new") => self.new_tab(),
                Some("close") => self.close_tab(),
                _ => self.last_status = Some("Usage: :tab new|close".to_string()),
            },
            _ => {
                self.last_status = Some(format!("Unknown command: {}", command));
            }
        }

        false
    }

    fn handle_export_command(&mut self, args: &[String]) {
        let format_name = args
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.export.default_format.clone());
        let format = match ExportFormat::parse(&format_name) {
            Ok(format) => format,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };
        let path = args
            .get(1)
            .map(|p| export::expand_home(p))
            .unwrap_or_else(|| export::default_export_path(format));

        let result = match self.view {
            View::Sql => &self.tabs.active().result,
            View::Browse => self.browse.page(),
            View::Structure => {
                self.last_error = Some(ExportError::NoData.to_string());
                return;
            }
        };

        match export::export_results(&result.columns, &result.rows, format, &path) {
            Ok(rows) => {
                self.last_status = Some(format!(
                    "Exported {} rows to {} as {}",
                    rows,
                    path.display(),
                    format
                ));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "export failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(text) {
                Ok(()) => {
                    let chars = text.chars().count();
                    self.last_status = Some(format!(
                        "Copied {} char{}",
                        chars,
                        if chars == 1 { "" } else { "s" }
                    ));
                }
                Err(e) => {
                    self.last_error = Some(format!("Failed to copy: {}", e));
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Clipboard unavailable: {}", e));
            }
        }
    }

    // ---------------------------------------------------------------------
    // Mouse
    // ---------------------------------------------------------------------

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = (mouse.column, mouse.row);

        if let Some(viewer) = self.cell_viewer.as_mut() {
            let code = match mouse.kind {
                MouseEventKind::ScrollDown => KeyCode::Char('j'),
                MouseEventKind::ScrollUp => KeyCode::Char('k'),
                _ => return,
            };
            viewer.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
            return;
        }
        if let Some(help) = self.help.as_mut() {
            match mouse.kind {
                MouseEventKind::ScrollDown => help.scroll_by(3),
                MouseEventKind::ScrollUp => help.scroll_by(-3),
                _ => {}
            }
            return;
        }
        if self.command.active {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.on_click(x, y),
            MouseEventKind::ScrollDown => self.on_scroll(x, y, true),
            MouseEventKind::ScrollUp => self.on_scroll(x, y, false),
            _ => {}
        }
    }

    fn on_click(&mut self, x: u16, y: u16) {
        if let Some(view) = hit_at(&self.areas.views, x, y) {
            return self.set_view(view);
        }
        if let Some(button) = hit_at(&self.areas.nav, x, y) {
            return self.press_nav(button);
        }

        match self.view {
            View::Structure => {
                if self.structure.click(x, y) {
                    self.structure_focus = StructureFocus::Tree;
                    self.refresh_definition();
                } else {
                    self.structure_focus = StructureFocus::Detail;
                }
            }
            View::Browse => {
                if let Some(area) = self.areas.tables.filter(|a| is_inside(x, y, *a)) {
                    self.browse_focus = BrowseFocus::Tables;
                    let row = y.saturating_sub(area.y + 1) as usize + self.table_list.offset();
                    let name = self.schema.table_names().get(row).map(|s| s.to_string());
                    if let Some(name) = name {
                        self.table_list.select(Some(row));
                        self.open_table(&name);
                    }
                } else if self.areas.filter.is_some_and(|a| is_inside(x, y, a)) {
                    if self.browse.table().is_some() {
                        self.filter.open(self.browse.filter().unwrap_or(""));
                        self.browse_focus = BrowseFocus::Filter;
                    }
                } else {
                    self.click_grid(x, y);
                }
            }
            View::Sql => {
                if let Some(index) = hit_at(&self.areas.query_tabs, x, y) {
                    self.switch_tab(index);
                } else if self.areas.editor.is_some_and(|a| is_inside(x, y, a)) {
                    self.sql_focus = SqlFocus::Editor;
                } else {
                    self.click_grid(x, y);
                }
            }
        }
    }

    fn click_grid(&mut self, x: u16, y: u16) {
        let Some(area) = self.areas.grid.filter(|a| is_inside(x, y, *a)) else {
            return;
        };
        let hit = match self.view {
            View::Browse => {
                self.browse_focus = BrowseFocus::Grid;
                self.browse_grid_state.hit_test(area, &self.browse_grid, x, y)
            }
            View::Sql => {
                self.sql_focus = SqlFocus::Results;
                self.sql_grid_state.hit_test(area, &self.sql_grid, x, y)
            }
            View::Structure => None,
        };

        match hit {
            Some(GridHit::Header(col)) if self.view == View::Browse => self.sort_browse(col),
            Some(GridHit::Cell(cell)) => self.activate_cell(cell),
            _ => {}
        }
    }

    fn on_scroll(&mut self, x: u16, y: u16, down: bool) {
        if self.view == View::Structure {
            if self.structure.scroll_wheel(x, y, down) {
                self.refresh_definition();
            }
            return;
        }
        if !self.areas.grid.is_some_and(|a| is_inside(x, y, a)) {
            return;
        }
        let code = if down { KeyCode::Down } else { KeyCode::Up };
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        let (state, model) = match self.view {
            View::Browse => (&mut self.browse_grid_state, &self.browse_grid),
            _ => (&mut self.sql_grid_state, &self.sql_grid),
        };
        if state.handle_key(key, model) {
            self.inspector.highlight(state.cursor());
        }
    }

    // ---------------------------------------------------------------------
    // Cells
    // ---------------------------------------------------------------------

    fn active_grid_state(&mut self) -> &mut GridState {
        match self.view {
            View::Sql => &mut self.sql_grid_state,
            _ => &mut self.browse_grid_state,
        }
    }

    /// Enter on the cursor cell.
    fn confirm_cell(&mut self) {
        let cell = self.active_grid_state().cursor();
        if self.inspector.confirm(cell) {
            self.open_cell(cell);
        }
    }

    /// Pointer activation: moves the cursor, then applies the two-threshold
    /// rule to decide whether this click opens the cell.
    fn activate_cell(&mut self, cell: CellRef) {
        let state = self.active_grid_state();
        if state.cursor() != cell {
            state.cursor_row = cell.row;
            state.cursor_col = cell.col;
            self.inspector.highlight(cell);
        }
        if self.inspector.select(cell) {
            self.open_cell(cell);
        }
    }

    fn open_cell(&mut self, cell: CellRef) {
        let (columns, row) = match self.view {
            View::Browse => {
                let page = self.browse.page();
                (&page.columns, page.rows.get(cell.row))
            }
            View::Sql => {
                let tab = self.tabs.active();
                (&tab.result.columns, tab.page_rows().get(cell.row))
            }
            View::Structure => return,
        };
        let column = columns.get(cell.col);
        let value = row.and_then(|r| r.get(cell.col));
        if let (Some(column), Some(value)) = (column, value) {
            tracing::debug!(column = %column, row = cell.row, "opened cell viewer");
            self.cell_viewer = Some(CellViewer::new(column.clone(), value));
        }
    }

    // ---------------------------------------------------------------------
    // Data
    // ---------------------------------------------------------------------

    fn reload_schema(&mut self) {
        let tree = match SchemaTree::load(&self.db) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load schema");
                self.last_error = Some(format!("Failed to load schema: {}", e));
                return;
            }
        };

        match tree.to_tree_items() {
            Ok(items) => self.structure.set_items(items),
            Err(e) => self.last_error = Some(format!("Failed to build schema tree: {}", e)),
        }
        self.schema = tree;
        self.refresh_definition();

        let count = self.schema.table_names().len();
        let selected = match count {
            0 => None,
            n => Some(self.table_list.selected().unwrap_or(0).min(n - 1)),
        };
        self.table_list.select(selected);
    }

    fn refresh_definition(&mut self) {
        let Some(node) = self.structure.selected() else {
            self.structure.set_detail(String::new());
            return;
        };
        let text = match schema_tree::definition_text(&self.db, &node) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => format!("Error: {}", e),
        };
        self.structure.set_detail(text);
    }

    pub fn open_table(&mut self, name: &str) {
        tracing::info!(table = %name, "opened table");
        self.browse.open_table(name);
        self.filter.clear();
        self.browse_grid_state.reset();
        self.browse_focus = BrowseFocus::Grid;
        self.load_browse();
    }

    fn clear_browse_filter(&mut self) {
        if self.browse.filter().is_none() {
            return;
        }
        self.browse.clear_filter();
        self.filter.clear();
        self.load_browse();
    }

    fn sort_browse(&mut self, col: usize) {
        let Some(column) = self.browse_grid.columns.get(col).cloned() else {
            return;
        };
        self.browse.sort_by(&column);
        self.load_browse();
        self.browse_grid_state.cursor_col = col;
    }

    /// Fetch the current browse page and rebuild its grid.
    fn load_browse(&mut self) {
        if let Err(e) = self.browse.load(&self.db) {
            self.last_error = Some(e.to_string());
        }
        let page = self.browse.page();
        self.browse_grid = GridModel::new(
            &page.columns,
            &page.rows,
            self.browse.sort(),
            &self.config.display,
        );
        let col = self.browse_grid_state.cursor_col;
        self.browse_grid_state.reset();
        self.browse_grid_state.cursor_col = col;
        self.inspector.clear();
    }

    fn press_nav(&mut self, button: NavButton) {
        match self.view {
            View::Browse => {
                let moved = match button {
                    NavButton::First => self.browse.first_page(),
                    NavButton::Prev => self.browse.prev_page(),
                    NavButton::Next => self.browse.next_page(),
                    NavButton::Last => self.browse.last_page(),
                };
                if moved {
                    self.load_browse();
                }
            }
            View::Sql => {
                let pager = &mut self.tabs.active_mut().pager;
                let moved = match button {
                    NavButton::First => pager.first(),
                    NavButton::Prev => pager.prev(),
                    NavButton::Next => pager.next(),
                    NavButton::Last => pager.last(),
                };
                if moved {
                    self.rebuild_sql_grid();
                }
            }
            View::Structure => {}
        }
    }

    fn run_query(&mut self) {
        let text = self.editor.text();
        let tab = self.tabs.active_mut();
        tab.query = text;
        tab.run(&self.db);

        let tab = self.tabs.active();
        if let Some(message) = tab.status.message() {
            if tab.status.is_error() {
                tracing::warn!(tab = tab.id.get(), %message, "query failed");
            } else {
                tracing::info!(tab = tab.id.get(), %message, "query executed");
            }
        }
        let changed_schema = !tab.status.is_error() && tab.result.columns == ["rows_affected"];
        self.last_status = tab.status.message();

        self.rebuild_sql_grid();
        self.sql_focus = SqlFocus::Results;

        if changed_schema {
            self.reload_schema();
            if self.browse.table().is_some() {
                self.load_browse();
            }
        }
    }

    fn rebuild_sql_grid(&mut self) {
        let tab = self.tabs.active();
        self.sql_grid = GridModel::new(
            &tab.result.columns,
            tab.page_rows(),
            None,
            &self.config.display,
        );
        self.sql_grid_state.reset();
        self.inspector.clear();
    }

    fn store_editor(&mut self) {
        self.tabs.active_mut().query = self.editor.text();
    }

    fn load_editor(&mut self) {
        self.editor.set_text(&self.tabs.active().query);
        self.rebuild_sql_grid();
    }

    fn new_tab(&mut self) {
        self.store_editor();
        match self.tabs.add() {
            Some(_) => {
                self.load_editor();
                self.sql_focus = SqlFocus::Editor;
                self.last_status = Some(format!("Opened {}", self.tabs.active().title()));
            }
            None => {
                self.last_status = Some(format!(
                    "Maximum of {} tabs reached",
                    self.tabs.max_tabs()
                ));
            }
        }
    }

    fn close_tab(&mut self) {
        let title = self.tabs.active().title();
        if self.tabs.close_active() {
            self.load_editor();
            self.last_status = Some(format!("Closed {}", title));
        } else {
            self.last_status = Some("Cannot close the last tab".to_string());
        }
    }

    fn switch_tab(&mut self, index: usize) {
        if index == self.tabs.active_index() || index >= self.tabs.len() {
            return;
        }
        self.store_editor();
        if self.tabs.select_index(index) {
            self.load_editor();
        }
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let error_height = if self.last_error.is_some() { 4 } else { 0 };
        let [header_area, body_area, error_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(error_height),
            Constraint::Length(1),
        ])
        .areas(size);

        self.areas = HitAreas::default();
        self.draw_header(frame, header_area);

        match self.view {
            View::Structure => self.structure.render(
                frame,
                body_area,
                self.structure_focus == StructureFocus::Detail,
            ),
            View::Browse => self.draw_browse(frame, body_area),
            View::Sql => self.draw_sql(frame, body_area),
        }

        if let Some(ref err) = self.last_error {
            let error = Paragraph::new(err.as_str())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Error (Enter to dismiss) ")
                        .border_style(Style::default().fg(Color::Red)),
                )
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false });
            frame.render_widget(error, error_area);
        }

        frame.render_widget(self.status_line(), status_area);

        if self.command.active {
            let h = 3u16.min(size.height);
            let area = Rect {
                x: 0,
                y: size.height.saturating_sub(h),
                width: size.width,
                height: h,
            };
            self.command.textarea.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" : Command (Enter run, Esc cancel) ")
                    .border_style(Style::default().fg(Color::Magenta)),
            );
            frame.render_widget(Clear, area);
            frame.render_widget(&self.command.textarea, area);
        }

        if let Some(help) = self.help.as_mut() {
            help.render(frame, size);
        }
        if let Some(viewer) = self.cell_viewer.as_mut() {
            viewer.render(frame, size);
        }
    }

    fn draw_header(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        let mut x = area.x;
        for view in View::ALL {
            let label = format!(" [{}] {} ", view.key(), view.label());
            let width = label.width() as u16;
            let style = if view == self.view {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            self.areas.views.push((Rect::new(x, area.y, width, 1), view));
            x = x.saturating_add(width + 1);
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }

        let file = self.db.path().display().to_string();
        let used: usize = spans.iter().map(|s| s.width()).sum();
        let pad = (area.width as usize).saturating_sub(used + file.width() + 1);
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(file, Style::default().fg(Color::DarkGray)));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_browse(&mut self, frame: &mut Frame, area: Rect) {
        let [tables_area, main_area] =
            Layout::horizontal([Constraint::Length(24), Constraint::Min(20)]).areas(area);
        let [filter_area, grid_area, nav_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(main_area);
        self.areas.tables = Some(tables_area);
        self.areas.filter = Some(filter_area);
        self.areas.grid = Some(grid_area);

        let names = self.schema.table_names();
        let items: Vec<ListItem> = names.iter().map(|n| ListItem::new(n.to_string())).collect();
        let current = self.browse.table();
        let list = List::new(items)
            .block(focus_block(" Tables ", self.browse_focus == BrowseFocus::Tables))
            .highlight_style(if current.is_some() {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(Color::DarkGray)
            })
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, tables_area, &mut self.table_list);

        let filter_focused = self.browse_focus == BrowseFocus::Filter;
        style_input(&mut self.filter.textarea, filter_focused);
        self.filter
            .textarea
            .set_block(focus_block(" Filter (/ edit, Ctrl+L clear) ", filter_focused));
        frame.render_widget(&self.filter.textarea, filter_area);

        self.browse_grid_state
            .ensure_visible_in(grid_area, &self.browse_grid);
        let title = match self.browse.table() {
            Some(t) => format!(" {} ", t),
            None => " Data ".to_string(),
        };
        frame.render_widget(
            DataGrid {
                model: &self.browse_grid,
                state: &self.browse_grid_state,
                title: &title,
                focused: self.browse_focus == BrowseFocus::Grid,
            },
            grid_area,
        );

        let label = if self.browse.error().is_some() {
            "Error".to_string()
        } else if self.browse.table().is_some() {
            self.browse.pager.label(self.browse.page().row_count())
        } else {
            String::new()
        };
        let pager = self.browse.pager.clone();
        self.draw_nav(frame, nav_area, &pager, &label);
    }

    fn draw_sql(&mut self, frame: &mut Frame, area: Rect) {
        let [tabs_area, editor_area, status_area, grid_area, nav_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);
        self.areas.editor = Some(editor_area);
        self.areas.grid = Some(grid_area);

        let mut spans = Vec::new();
        let mut x = tabs_area.x;
        for (i, tab) in self.tabs.iter().enumerate() {
            let label = format!(" {}:{} ", i + 1, tab.title());
            let width = label.width() as u16;
            let style = if i == self.tabs.active_index() {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            self.areas
                .query_tabs
                .push((Rect::new(x, tabs_area.y, width, 1), i));
            x = x.saturating_add(width + 1);
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            " Ctrl+T new  Ctrl+W close  Alt+N switch",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), tabs_area);

        let editor_focused = self.sql_focus == SqlFocus::Editor;
        style_input(&mut self.editor.textarea, editor_focused);
        self.editor.textarea.set_block(focus_block(
            " Query (F5/Ctrl+R run, Tab to results) ",
            editor_focused,
        ));
        frame.render_widget(&self.editor.textarea, editor_area);

        let tab = self.tabs.active();
        let status = match tab.status.message() {
            Some(msg) if tab.status.is_error() => {
                Span::styled(msg, Style::default().fg(Color::Red))
            }
            Some(msg) => Span::styled(msg, Style::default().fg(Color::Green)),
            None => Span::styled(
                "Press F5 to execute the query",
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(Line::from(status)), status_area);

        self.sql_grid_state.ensure_visible_in(grid_area, &self.sql_grid);
        frame.render_widget(
            DataGrid {
                model: &self.sql_grid,
                state: &self.sql_grid_state,
                title: " Results ",
                focused: !editor_focused,
            },
            grid_area,
        );

        let tab = self.tabs.active();
        let label = if tab.result.is_empty() {
            String::new()
        } else {
            tab.pager.label(tab.page_rows().len())
        };
        let pager = tab.pager.clone();
        self.draw_nav(frame, nav_area, &pager, &label);
    }

    fn draw_nav(&mut self, frame: &mut Frame, area: Rect, pager: &Pager, label: &str) {
        let controls = pager.controls();
        let enabled = [controls.first, controls.prev, controls.next, controls.last];

        let mut spans = Vec::new();
        let mut x = area.x;
        for (button, on) in NavButton::ALL.into_iter().zip(enabled) {
            let text = button.label();
            let width = text.width() as u16;
            let style = if on {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            self.areas.nav.push((Rect::new(x, area.y, width, 1), button));
            x = x.saturating_add(width + 1);
            spans.push(Span::styled(text, style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(" "));
        spans.push(Span::styled(label.to_string(), Style::default().fg(Color::Cyan)));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn status_line(&self) -> Paragraph<'static> {
        let text = match (&self.last_status, self.view) {
            (Some(status), _) => status.clone(),
            (None, View::Browse) => self.browse.status_text(),
            (None, View::Sql) => {
                "Tab switch focus | Ctrl+E export | Ctrl+Y copy query | ? help".to_string()
            }
            (None, View::Structure) => {
                "Select an object to view its definition | r reload | ? help".to_string()
            }
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                " sqv ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(text),
        ]))
        .style(Style::default().bg(Color::Black).fg(Color::Gray))
    }
}

fn hit_at<T: Copy>(areas: &[(Rect, T)], x: u16, y: u16) -> Option<T> {
    areas
        .iter()
        .find(|(r, _)| is_inside(x, y, *r))
        .map(|(_, v)| *v)
}

fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(color))
}

/// Only the focused input shows a cursor.
fn style_input(textarea: &mut TextArea<'static>, focused: bool) {
    let cursor = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    textarea.set_cursor_style(cursor);
}
