/// A single named slot of durable text.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension};

pub trait BlobSlot {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, value: &str) -> Result<()>;
}

/// One row of the `kv` table.
pub struct SqliteSlot {
    conn: Connection,
    key: String,
}

impl SqliteSlot {
    pub fn new(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }
}

impl BlobSlot for SqliteSlot {
    fn read(&self) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [&self.key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (&self.key, value, Local::now().to_rfc3339()),
        )?;
        Ok(())
    }
}

/// Process-local slot. Clones share the stored value.
#[derive(Clone, Default)]
pub struct MemorySlot {
    value: Rc<RefCell<Option<String>>>,
}

impl MemorySlot {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Rc::new(RefCell::new(Some(value.into()))),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl BlobSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.get())
    }

    fn write(&self, value: &str) -> Result<()> {
        *self.value.borrow_mut() = Some(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    #[test]
    fn sqlite_slot_overwrites_in_place() {
        let slot = SqliteSlot::new(init_in_memory().unwrap(), "projects");
        assert_eq!(slot.read().unwrap(), None);
        slot.write("[]").unwrap();
        slot.write("[1]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[1]"));
        let rows: i64 = slot
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn memory_slot_clones_share_value() {
        let slot = MemorySlot::default();
        let view = slot.clone();
        slot.write("hello").unwrap();
        assert_eq!(view.get().as_deref(), Some("hello"));
    }
}
