mod cell_viewer;
mod editor;
mod grid;
mod help_popup;
mod mouse_util;
mod structure;

pub use cell_viewer::{CellViewer, CellViewerAction};
pub use editor::{LineInput, QueryEditor};
pub use grid::{DataGrid, GridHit, GridModel, GridState};
pub use help_popup::{HelpAction, HelpPopup};
pub use mouse_util::is_inside;
pub use structure::StructurePane;

use ratatui::layout::Rect;

/// A `width` x `height` rect centered in `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Flatten a buffer into its symbols, row by row.
#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    buf.content.iter().map(|c| c.symbol()).collect()
}
