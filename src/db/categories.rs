use crate::libs::error::{RpcError, RpcResult};
use crate::libs::todo::{Category, CategoryColor, CategoryPatch, NewCategory};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INSERT_CATEGORY: &str = "INSERT INTO categories (owner_id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)";
const UPDATE_CATEGORY: &str = "UPDATE categories SET name = COALESCE(?3, name), color = COALESCE(?4, color) WHERE id = ?1 AND owner_id = ?2";
const DELETE_CATEGORY: &str = "DELETE FROM categories WHERE id = ?1 AND owner_id = ?2";
const DETACH_TODOS: &str = "UPDATE todos SET category_id = NULL WHERE category_id = ?1 AND owner_id = ?2";
const SELECT_CATEGORIES: &str = "SELECT id, name, color, owner_id, created_at FROM categories WHERE owner_id = ?1 ORDER BY name";
const SELECT_CATEGORY: &str = "SELECT id, name, color, owner_id, created_at FROM categories WHERE id = ?1 AND owner_id = ?2";

pub struct Categories<'a> {
    conn: &'a mut Connection,
}

impl<'a> Categories<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    pub fn list(&mut self, owner_id: i64) -> RpcResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(SELECT_CATEGORIES)?;
        let categories = stmt
            .query_map(params![owner_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get(&mut self, owner_id: i64, id: i64) -> RpcResult<Option<Category>> {
        let category = self.conn.query_row(SELECT_CATEGORY, params![id, owner_id], Self::from_row).optional()?;
        Ok(category)
    }

    /// A duplicate name for the same owner is a `Conflict`.
    pub fn insert(&mut self, owner_id: i64, input: &NewCategory) -> RpcResult<Category> {
        let name = input.name.trim();
        self.conn
            .execute(INSERT_CATEGORY, params![owner_id, name, input.color.as_str(), Utc::now()])
            .map_err(|e| Self::name_conflict(e, name))?;
        let id = self.conn.last_insert_rowid();

        self.get(owner_id, id)?
            .ok_or_else(|| RpcError::Internal(format!("category {} vanished after insert", id)))
    }

    pub fn update(&mut self, owner_id: i64, id: i64, patch: &CategoryPatch) -> RpcResult<Option<Category>> {
        let name = patch.name.as_deref().map(str::trim);
        let affected = self
            .conn
            .execute(UPDATE_CATEGORY, params![id, owner_id, name, patch.color.map(CategoryColor::as_str)])
            .map_err(|e| Self::name_conflict(e, name.unwrap_or_default()))?;
        if affected == 0 {
            return Ok(None);
        }
        self.get(owner_id, id)
    }

    /// Removes the category and detaches its tasks; tasks are never deleted.
    pub fn delete(&mut self, owner_id: i64, id: i64) -> RpcResult<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(DETACH_TODOS, params![id, owner_id])?;
        let affected = tx.execute(DELETE_CATEGORY, params![id, owner_id])?;
        tx.commit()?;
        Ok(affected > 0)
    }

    fn name_conflict(err: rusqlite::Error, name: &str) -> RpcError {
        match RpcError::from(err) {
            RpcError::Conflict(_) => RpcError::Conflict(format!("category '{}' already exists", name)),
            other => other,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Category> {
        let color: String = row.get(2)?;
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            color: color.parse().unwrap_or_default(),
            owner_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
