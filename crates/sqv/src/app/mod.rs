#[allow(clippy::module_inception)]
mod app;
mod state;

pub use app::App;
pub use state::{BrowseFocus, NavButton, SqlFocus, StructureFocus, View};
