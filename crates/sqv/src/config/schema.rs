//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::inspect::InspectPolicy;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display settings
    pub display: DisplayConfig,
    /// Cell viewer activation timing
    pub inspect: InspectConfig,
    /// Execute SQL view settings
    pub sql: SqlConfig,
    /// Export settings
    pub export: ExportConfig,
}

/// Display-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows fetched per page
    pub page_size: u64,
    /// Cells longer than this are truncated in the grid
    pub max_cell_width: usize,
    /// Minimum column width
    pub min_column_width: u16,
    /// Maximum column width
    pub max_column_width: u16,
    /// NULL indicator text
    pub null_indicator: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_cell_width: 100,
            min_column_width: 3,
            max_column_width: 40,
            null_indicator: "NULL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// A click on a cell highlighted for longer than this opens the viewer
    pub debounce_ms: u64,
    /// Two clicks on the same cell within this window open the viewer
    pub double_activation_ms: u64,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            double_activation_ms: 500,
        }
    }
}

impl InspectConfig {
    pub fn policy(&self) -> InspectPolicy {
        InspectPolicy {
            debounce: Duration::from_millis(self.debounce_ms),
            double_activation: Duration::from_millis(self.double_activation_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Maximum number of query tabs
    pub max_tabs: usize,
    /// Text placed in every new tab
    pub default_query: String,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            max_tabs: 5,
            default_query: "SELECT * FROM sqlite_master LIMIT 10;".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when `:export` is given no format (csv or json)
    pub default_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
        }
    }
}
