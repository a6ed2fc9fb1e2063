use crate::libs::error::RpcResult;
use chrono::Utc;
use rusqlite::{params, Connection};

const UPSERT_USER: &str = "INSERT INTO users (subject, email, created_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(subject) DO UPDATE SET email = COALESCE(excluded.email, users.email)";
const SELECT_USER_ID: &str = "SELECT id FROM users WHERE subject = ?1";

pub struct Users<'a> {
    conn: &'a Connection,
}

impl<'a> Users<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Records the owner on first contact and returns its local id.
    pub fn upsert(&self, subject: &str, email: Option<&str>) -> RpcResult<i64> {
        self.conn.execute(UPSERT_USER, params![subject, email, Utc::now()])?;
        let id = self.conn.query_row(SELECT_USER_ID, params![subject], |row| row.get(0))?;
        Ok(id)
    }
}
