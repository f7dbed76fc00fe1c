use std::env;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use sqv::app::App;
use sqv::config;
use sqv::db::Database;
use sqv::error::OpenError;
use sqv::logging::init_logging;

fn print_version() {
    println!("sqv {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("sqv - SQLite database viewer");
    eprintln!();
    eprintln!("Usage: sqv [OPTIONS] DATABASE");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  DATABASE          Path to an existing SQLite database file");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help        Print this help message");
    eprintln!("  -V, -v, --version Print version information");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  SQV_CONFIG_DIR    Override the configuration directory");
    eprintln!("  SQV_LOG           Log filter (default: sqv=info)");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    if let Some(path) = config::log_path() {
        eprintln!("  Log file:    {}", path.display());
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "-V" || a == "-v" || a == "--version") {
        print_version();
        return ExitCode::SUCCESS;
    }

    let Some(path) = args.iter().find(|a| !a.starts_with('-')).map(PathBuf::from) else {
        print_usage();
        return ExitCode::from(2);
    };

    let cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {:#}", e);
        config::Config::default()
    });

    if let Some(log) = config::log_path() {
        init_logging(&log);
    }

    let db = match Database::open(&path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to open database");
            match e {
                OpenError::FileNotFound(p) => {
                    eprintln!("Error: Database file not found: {}", p.display())
                }
                OpenError::Engine(e) => eprintln!("Error: Failed to open database: {}", e),
            }
            return ExitCode::FAILURE;
        }
    };

    match run(db, cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the UI, then close the connection once the terminal is restored.
fn run(db: Database, cfg: config::Config) -> Result<()> {
    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(db, cfg);
    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;

    let closed = app.into_database().close();
    if let Err(e) = &closed {
        tracing::warn!(error = %e, "failed to close database");
    }

    res?;
    closed.context("failed to close database")
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
