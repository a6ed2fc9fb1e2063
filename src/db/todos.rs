//! Task repository of the authoritative store.
//!
//! Every read and write is scoped to one owner: the owner id is a bound
//! parameter of each statement, so a foreign id behaves exactly like a
//! missing one and surfaces as `None`, `false` or [`RpcError::NotFound`].
//!
//! Rows are returned in display order: `position` ascending, then newest
//! first by `created_at` and `id`. New tasks start at position 0, so they
//! appear at the top until the owner reorders them.
//!
//! Placeholder ids never reach this module. The RPC handlers turn
//! `TodoId::Pending` into a no-op before a statement is built, and rows are
//! always decoded as `TodoId::Persisted`.

use crate::libs::error::{RpcError, RpcResult};
use crate::libs::todo::{NewTodo, Todo, TodoId, TodoPatch};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TODO_COLUMNS: &str = "id, text, completed, notes, category_id, position, owner_id, created_at, updated_at";
const INSERT_TODO: &str = "INSERT INTO todos (owner_id, text, completed, notes, category_id, position, created_at, updated_at)
    VALUES (?1, ?2, FALSE, ?3, ?4, 0, ?5, ?5)";
const UPDATE_TODO: &str = "UPDATE todos SET
    text = COALESCE(?3, text),
    notes = CASE WHEN ?4 IS NULL THEN notes WHEN ?4 = '' THEN NULL ELSE ?4 END,
    completed = COALESCE(?5, completed),
    updated_at = ?6
    WHERE id = ?1 AND owner_id = ?2";
const TOGGLE_TODO: &str = "UPDATE todos SET completed = NOT completed, updated_at = ?3 WHERE id = ?1 AND owner_id = ?2";
const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?1 AND owner_id = ?2";
const DELETE_COMPLETED: &str = "DELETE FROM todos WHERE owner_id = ?1 AND completed = TRUE";
const SET_POSITION: &str = "UPDATE todos SET position = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2";
const OWNS_TODO: &str = "SELECT COUNT(*) FROM todos WHERE id = ?1 AND owner_id = ?2";
const OWNS_CATEGORY: &str = "SELECT COUNT(*) FROM categories WHERE id = ?1 AND owner_id = ?2";
const ORDER_BY: &str = "ORDER BY position ASC, created_at DESC, id DESC";

/// Optional narrowing of `todo.list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub category_id: Option<i64>,
}

/// Owner-scoped access to the `todos` table. Every statement carries an
/// `owner_id` predicate.
pub struct Todos<'a> {
    conn: &'a mut Connection,
}

impl<'a> Todos<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// One page of the owner's tasks in display order, plus the total
    /// number of matching rows.
    pub fn list(&mut self, owner_id: i64, filter: TodoFilter, limit: u32, offset: u32) -> RpcResult<(Vec<Todo>, u64)> {
        let mut clauses = vec!["owner_id = ?".to_string()];
        let mut values = vec![Value::Integer(owner_id)];
        if let Some(completed) = filter.completed {
            clauses.push("completed = ?".to_string());
            values.push(Value::Integer(completed as i64));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push("category_id = ?".to_string());
            values.push(Value::Integer(category_id));
        }
        let where_clause = clauses.join(" AND ");

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM todos WHERE {}", where_clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let mut page_values = values;
        page_values.push(Value::Integer(limit as i64));
        page_values.push(Value::Integer(offset as i64));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM todos WHERE {} {} LIMIT ? OFFSET ?",
            TODO_COLUMNS, where_clause, ORDER_BY
        ))?;
        let todos = stmt
            .query_map(params_from_iter(page_values.iter()), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((todos, total as u64))
    }

    /// The task, if the owner has it.
    pub fn get(&mut self, owner_id: i64, id: i64) -> RpcResult<Option<Todo>> {
        let todo = self
            .conn
            .query_row(
                &format!("SELECT {} FROM todos WHERE id = ?1 AND owner_id = ?2", TODO_COLUMNS),
                params![id, owner_id],
                Self::from_row,
            )
            .optional()?;
        Ok(todo)
    }

    /// Inserts at position 0 and returns the stored row.
    pub fn insert(&mut self, owner_id: i64, input: &NewTodo) -> RpcResult<Todo> {
        if let Some(category_id) = input.category_id {
            let owned: i64 = self.conn.query_row(OWNS_CATEGORY, params![category_id, owner_id], |row| row.get(0))?;
            if owned == 0 {
                return Err(RpcError::not_found(format!("category {}", category_id)));
            }
        }

        let notes = input.notes.as_deref().filter(|n| !n.is_empty());
        self.conn
            .execute(INSERT_TODO, params![owner_id, input.text.trim(), notes, input.category_id, Utc::now()])?;
        let id = self.conn.last_insert_rowid();

        self.get(owner_id, id)?
            .ok_or_else(|| RpcError::Internal(format!("todo {} vanished after insert", id)))
    }

    /// Applies a patch; `None` when the id does not resolve under the owner.
    pub fn update(&mut self, owner_id: i64, id: i64, patch: &TodoPatch) -> RpcResult<Option<Todo>> {
        let text = patch.text.as_deref().map(str::trim);
        let affected = self
            .conn
            .execute(UPDATE_TODO, params![id, owner_id, text, patch.notes, patch.completed, Utc::now()])?;
        if affected == 0 {
            return Ok(None);
        }
        self.get(owner_id, id)
    }

    pub fn toggle(&mut self, owner_id: i64, id: i64) -> RpcResult<Option<Todo>> {
        let affected = self.conn.execute(TOGGLE_TODO, params![id, owner_id, Utc::now()])?;
        if affected == 0 {
            return Ok(None);
        }
        self.get(owner_id, id)
    }

    /// Returns whether a row was removed.
    pub fn delete(&mut self, owner_id: i64, id: i64) -> RpcResult<bool> {
        let affected = self.conn.execute(DELETE_TODO, params![id, owner_id])?;
        Ok(affected > 0)
    }

    /// Deletes every completed task of the owner and returns how many went.
    pub fn clear_completed(&mut self, owner_id: i64) -> RpcResult<u64> {
        let affected = self.conn.execute(DELETE_COMPLETED, params![owner_id])?;
        Ok(affected as u64)
    }

    /// Persists a batch of `(id, order)` pairs atomically.
    ///
    /// Ownership of every id is checked before the first write; a single
    /// foreign or missing id rejects the whole batch and nothing changes.
    pub fn reorder(&mut self, owner_id: i64, items: &[(i64, i64)]) -> RpcResult<()> {
        let tx = self.conn.transaction()?;

        for (id, _) in items {
            let owned: i64 = tx.query_row(OWNS_TODO, params![id, owner_id], |row| row.get(0))?;
            if owned == 0 {
                return Err(RpcError::not_found(format!("todo {}", id)));
            }
        }

        let now = Utc::now();
        {
            let mut stmt = tx.prepare(SET_POSITION)?;
            for (id, order) in items {
                stmt.execute(params![id, owner_id, order, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Todo> {
        Ok(Todo {
            id: TodoId::Persisted(row.get(0)?),
            text: row.get(1)?,
            completed: row.get(2)?,
            notes: row.get(3)?,
            category_id: row.get(4)?,
            order: row.get(5)?,
            owner_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
