/// Schema creation, tracked through `PRAGMA user_version`.
use anyhow::{Result, bail};
use rusqlite::Connection;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    "
    CREATE TABLE IF NOT EXISTS kv (
        key         TEXT    PRIMARY KEY,
        value       TEXT    NOT NULL,
        updated_at  TEXT    NOT NULL
    );
    ",
)];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let latest = latest_version();
    if current > latest {
        bail!("database schema version {current} is newer than supported version {latest}");
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        tx.execute_batch(sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
        log::info!("applied schema migration {version}");
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_reaches_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(user_version(&conn), latest_version());
        run_migrations(&mut conn).unwrap();
        assert_eq!(user_version(&conn), latest_version());
    }

    #[test]
    fn newer_schema_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        let err = run_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }
}
