//! Server-side procedure handlers.
//!
//! Every call resolves the caller, upserts the owner row and then runs with
//! that owner's id. Rows of other owners are indistinguishable from rows
//! that do not exist: both are `NotFound`.
//!
//! Pending ids (negative on the wire) are placeholders that never reached
//! the store. `todo.update` and `todo.toggle` answer them with `null`,
//! `todo.delete` with success, and `todo.reorder` skips them, all without
//! touching the database.

use super::auth::Authenticator;
use crate::api::procedures::{
    CategoryIdInput, CategoryUpdateInput, ClearCompletedOutput, IdInput, ListInput, ListOutput, Procedure, ReorderInput, SuccessOutput,
    UpdateInput, MAX_LIST_LIMIT,
};
use crate::db::categories::Categories;
use crate::db::db::Db;
use crate::db::todos::{TodoFilter, Todos};
use crate::db::users::Users;
use crate::libs::error::{RpcError, RpcResult};
use crate::libs::todo::{Category, CategoryPatch, NewCategory, NewTodo, Todo, TodoId, TodoPatch, MAX_CATEGORY_NAME_LEN, MAX_NOTES_LEN, MAX_TEXT_LEN};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TodoRouter {
    db: Arc<Mutex<Db>>,
    auth: Authenticator,
}

impl TodoRouter {
    pub fn new(db: Db, auth: Authenticator) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            auth,
        }
    }

    /// Runs one procedure for the caller behind `credential`.
    pub fn dispatch(&self, credential: Option<&str>, procedure: Procedure, input: Value) -> RpcResult<Value> {
        let identity = self.auth.authenticate(credential)?;
        let mut db = self.db.lock();
        let owner = Users::new(&db.conn).upsert(&identity.subject, identity.email.as_deref())?;
        debug!(owner, %procedure, "dispatch");

        let conn = &mut db.conn;
        match procedure {
            Procedure::TodoList => encode(list(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::TodoCreate => encode(create(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::TodoUpdate => encode(update(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::TodoToggle => encode(toggle(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::TodoDelete => encode(delete(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::TodoClearCompleted => {
                let deleted_count = Todos::new(conn).clear_completed(owner)?;
                info!(owner, deleted_count, "cleared completed todos");
                encode(ClearCompletedOutput { deleted_count })
            }
            Procedure::TodoReorder => encode(reorder(&mut Todos::new(conn), owner, decode(input)?)?),
            Procedure::CategoryList => encode(Categories::new(conn).list(owner)?),
            Procedure::CategoryCreate => encode(create_category(&mut Categories::new(conn), owner, decode(input)?)?),
            Procedure::CategoryUpdate => encode(update_category(&mut Categories::new(conn), owner, decode(input)?)?),
            Procedure::CategoryDelete => encode(delete_category(&mut Categories::new(conn), owner, decode(input)?)?),
        }
    }
}

fn decode<T: DeserializeOwned>(input: Value) -> RpcResult<T> {
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input).map_err(|e| RpcError::BadRequest(e.to_string()))
}

fn encode<T: Serialize>(output: T) -> RpcResult<Value> {
    serde_json::to_value(output).map_err(|e| RpcError::Internal(e.to_string()))
}

fn list(todos: &mut Todos, owner: i64, input: ListInput) -> RpcResult<ListOutput> {
    if input.limit == 0 || input.limit > MAX_LIST_LIMIT {
        return Err(RpcError::BadRequest(format!("limit must be between 1 and {}", MAX_LIST_LIMIT)));
    }
    let filter = TodoFilter {
        completed: input.completed,
        category_id: input.category_id,
    };
    let (page, total) = todos.list(owner, filter, input.limit, input.offset)?;

    let seen = input.offset as u64 + page.len() as u64;
    let has_more = seen < total;
    Ok(ListOutput {
        todos: page,
        total,
        has_more,
        next_offset: has_more.then_some(seen as u32),
    })
}

fn create(todos: &mut Todos, owner: i64, input: NewTodo) -> RpcResult<Todo> {
    validate_text(&input.text)?;
    if let Some(notes) = &input.notes {
        validate_notes(notes)?;
    }
    let todo = todos.insert(owner, &input)?;
    info!(owner, id = %todo.id, "created todo");
    Ok(todo)
}

fn update(todos: &mut Todos, owner: i64, input: UpdateInput) -> RpcResult<Option<Todo>> {
    let TodoId::Persisted(id) = input.id else {
        debug!(owner, id = %input.id, "update of a pending id ignored");
        return Ok(None);
    };
    validate_patch(&input.data)?;

    let todo = todos.update(owner, id, &input.data)?.ok_or_else(|| RpcError::not_found(format!("todo {}", id)))?;
    info!(owner, id, "updated todo");
    Ok(Some(todo))
}

fn toggle(todos: &mut Todos, owner: i64, input: IdInput) -> RpcResult<Option<Todo>> {
    let TodoId::Persisted(id) = input.id else {
        debug!(owner, id = %input.id, "toggle of a pending id ignored");
        return Ok(None);
    };
    let todo = todos.toggle(owner, id)?.ok_or_else(|| RpcError::not_found(format!("todo {}", id)))?;
    info!(owner, id, completed = todo.completed, "toggled todo");
    Ok(Some(todo))
}

fn delete(todos: &mut Todos, owner: i64, input: IdInput) -> RpcResult<SuccessOutput> {
    let TodoId::Persisted(id) = input.id else {
        debug!(owner, id = %input.id, "delete of a pending id ignored");
        return Ok(SuccessOutput { success: true });
    };
    if !todos.delete(owner, id)? {
        return Err(RpcError::not_found(format!("todo {}", id)));
    }
    info!(owner, id, "deleted todo");
    Ok(SuccessOutput { success: true })
}

fn reorder(todos: &mut Todos, owner: i64, input: ReorderInput) -> RpcResult<SuccessOutput> {
    let items: Vec<(i64, i64)> = input
        .items
        .iter()
        .filter_map(|item| item.id.persisted().map(|id| (id, item.order)))
        .collect();
    if !items.is_empty() {
        todos.reorder(owner, &items)?;
    }
    info!(owner, persisted = items.len(), skipped = input.items.len() - items.len(), "reordered todos");
    Ok(SuccessOutput { success: true })
}

fn create_category(categories: &mut Categories, owner: i64, input: NewCategory) -> RpcResult<Category> {
    validate_category_name(&input.name)?;
    let category = categories.insert(owner, &input)?;
    info!(owner, id = category.id, "created category");
    Ok(category)
}

fn update_category(categories: &mut Categories, owner: i64, input: CategoryUpdateInput) -> RpcResult<Category> {
    let CategoryUpdateInput { id, data } = input;
    validate_category_patch(&data)?;
    let category = categories.update(owner, id, &data)?.ok_or_else(|| RpcError::not_found(format!("category {}", id)))?;
    info!(owner, id, "updated category");
    Ok(category)
}

fn delete_category(categories: &mut Categories, owner: i64, input: CategoryIdInput) -> RpcResult<SuccessOutput> {
    if !categories.delete(owner, input.id)? {
        return Err(RpcError::not_found(format!("category {}", input.id)));
    }
    info!(owner, id = input.id, "deleted category");
    Ok(SuccessOutput { success: true })
}

fn validate_text(text: &str) -> RpcResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RpcError::BadRequest("text must not be empty".into()));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(RpcError::BadRequest(format!("text exceeds {} characters", MAX_TEXT_LEN)));
    }
    Ok(())
}

fn validate_notes(notes: &str) -> RpcResult<()> {
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(RpcError::BadRequest(format!("notes exceed {} characters", MAX_NOTES_LEN)));
    }
    Ok(())
}

fn validate_patch(patch: &TodoPatch) -> RpcResult<()> {
    if let Some(text) = &patch.text {
        validate_text(text)?;
    }
    if let Some(notes) = &patch.notes {
        validate_notes(notes)?;
    }
    Ok(())
}

fn validate_category_name(name: &str) -> RpcResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RpcError::BadRequest("category name must not be empty".into()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(RpcError::BadRequest(format!("category name exceeds {} characters", MAX_CATEGORY_NAME_LEN)));
    }
    Ok(())
}

fn validate_category_patch(patch: &CategoryPatch) -> RpcResult<()> {
    if let Some(name) = &patch.name {
        validate_category_name(name)?;
    }
    Ok(())
}
