use super::migrations::init_with_migrations;
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "todosync.db";

/// Handle to the authoritative task store.
///
/// Every constructor except [`Db::new_without_migrations`] enables foreign
/// keys and brings the schema up to date.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database configured in `server.database`, falling back to
    /// `todosync.db` in the data directory.
    pub fn new() -> Result<Db> {
        Self::open(Self::path()?)
    }

    /// The configured database file.
    pub fn path() -> Result<PathBuf> {
        match Config::load()?.server.and_then(|server| server.database) {
            Some(path) => Ok(path),
            None => DataStorage::new().get_path(DB_FILE_NAME),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        let conn = Connection::open(path)?;
        Self::prepare(conn)
    }

    /// Private in-memory database, used by tests and embedded single-process
    /// setups.
    pub fn in_memory() -> Result<Db> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn)
    }

    pub fn new_without_migrations() -> Result<Connection> {
        let conn = Connection::open(Self::path()?)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn prepare(mut conn: Connection) -> Result<Db> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }
}
