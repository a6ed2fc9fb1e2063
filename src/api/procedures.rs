//! Procedure names and the JSON shapes of their inputs and outputs.

use crate::libs::error::RpcError;
use crate::libs::todo::{CategoryPatch, ReorderItem, Todo, TodoId, TodoPatch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    TodoList,
    TodoCreate,
    TodoUpdate,
    TodoToggle,
    TodoDelete,
    TodoClearCompleted,
    TodoReorder,
    CategoryList,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
}

impl Procedure {
    pub const ALL: [Procedure; 11] = [
        Procedure::TodoList,
        Procedure::TodoCreate,
        Procedure::TodoUpdate,
        Procedure::TodoToggle,
        Procedure::TodoDelete,
        Procedure::TodoClearCompleted,
        Procedure::TodoReorder,
        Procedure::CategoryList,
        Procedure::CategoryCreate,
        Procedure::CategoryUpdate,
        Procedure::CategoryDelete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Procedure::TodoList => "todo.list",
            Procedure::TodoCreate => "todo.create",
            Procedure::TodoUpdate => "todo.update",
            Procedure::TodoToggle => "todo.toggle",
            Procedure::TodoDelete => "todo.delete",
            Procedure::TodoClearCompleted => "todo.clearCompleted",
            Procedure::TodoReorder => "todo.reorder",
            Procedure::CategoryList => "category.list",
            Procedure::CategoryCreate => "category.create",
            Procedure::CategoryUpdate => "category.update",
            Procedure::CategoryDelete => "category.delete",
        }
    }

    /// Whether the procedure changes server state.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Procedure::TodoList | Procedure::CategoryList)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Procedure {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Procedure::ALL
            .into_iter()
            .find(|procedure| procedure.as_str() == s)
            .ok_or_else(|| RpcError::NotFound(format!("no procedure named '{}'", s)))
    }
}

/// Input of `todo.list`. Every field is optional on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListInput {
    pub limit: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl Default for ListInput {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            completed: None,
            category_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub todos: Vec<Todo>,
    pub total: u64,
    pub has_more: bool,
    /// Present exactly when `has_more` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInput {
    pub id: TodoId,
    pub data: TodoPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdInput {
    pub id: TodoId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessOutput {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCompletedOutput {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderInput {
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdateInput {
    pub id: i64,
    pub data: CategoryPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIdInput {
    pub id: i64,
}

/// Input of the procedures that take no arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoInput {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for procedure in Procedure::ALL {
            assert_eq!(procedure.as_str().parse::<Procedure>().unwrap(), procedure);
        }
        assert!("todo.archive".parse::<Procedure>().unwrap_err().is_not_found());
    }

    #[test]
    fn list_input_defaults_when_fields_are_missing() {
        let input: ListInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.limit, 50);
        assert_eq!(input.offset, 0);

        let input: ListInput = serde_json::from_str(r#"{"limit": 10, "categoryId": 3}"#).unwrap();
        assert_eq!(input.limit, 10);
        assert_eq!(input.category_id, Some(3));
    }

    #[test]
    fn next_offset_is_omitted_on_the_last_page() {
        let output = ListOutput {
            todos: Vec::new(),
            total: 0,
            has_more: false,
            next_offset: None,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, serde_json::json!({"todos": [], "total": 0, "hasMore": false}));
    }
}
