pub mod app;
pub mod browse;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod format;
pub mod inspect;
pub mod logging;
pub mod pager;
pub mod schema_tree;
pub mod tabs;
pub mod ui;
