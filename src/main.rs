mod app;
mod cli;
mod event;
mod tui;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use punchcard::db::{self, SqliteSlot};
use punchcard::{Store, SystemClock, logging, persist};

const IN_MEMORY_DB: &str = ":memory:";

fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let log_dir = cli_opts
        .log_dir
        .clone()
        .unwrap_or_else(logging::default_log_dir);
    let _logger = logging::init(&cli_opts.log_level, &log_dir)?;

    let conn = match cli_opts.db.as_deref() {
        Some(path) if path == Path::new(IN_MEMORY_DB) => db::init_in_memory()?,
        Some(path) => db::init(path)?,
        None => db::init(&db::default_db_path())?,
    };
    let slot = SqliteSlot::new(conn, persist::STORAGE_KEY);
    let mut store = Store::open(Box::new(slot), Box::new(SystemClock))
        .context("failed to open the project store")?;

    if let Some(command) = cli_opts.command {
        if let Some(notice) = store.take_notice() {
            println!("{notice}");
        }
        return cli::run(command, &mut store);
    }

    let mut app = app::App::new(store);
    let mut terminal = tui::init()?;
    let result = event::run(&mut app, &mut terminal);

    tui::restore()?;

    if let Err(err) = &result {
        log::error!("terminal UI failed: {err:#}");
    }
    result
}
