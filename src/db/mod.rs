/// SQLite-backed key/value slots that hold the durable blob.
mod migrations;
mod slot;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;

pub use migrations::latest_version;
pub use slot::{BlobSlot, MemorySlot, SqliteSlot};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    migrations::run_migrations(&mut conn)?;
    log::info!("opened database at {}", db_path.display());
    Ok(conn)
}

/// In-memory database with the same schema.
pub fn init_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./punchcard.db` when no data dir is found.
pub fn default_db_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join("punchcard");
        std::fs::create_dir_all(&app_dir).ok();
        app_dir.join("punchcard.db")
    } else {
        PathBuf::from("punchcard.db")
    }
}
