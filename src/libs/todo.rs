//! Task and category domain types shared by the store, the RPC layer and
//! every surface.
//!
//! Identifiers are modelled as [`TodoId`]: a task is either `Persisted`
//! (the server assigned its id) or `Pending` (an optimistic placeholder that
//! exists only in one surface's cache until the create call settles). On the
//! wire a pending id is encoded as a negative integer, which is how the
//! server recognises it and turns the request into a no-op.

use crate::libs::messages::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Maximum task text length, in characters.
pub const MAX_TEXT_LEN: usize = 500;
/// Maximum notes length, in characters.
pub const MAX_NOTES_LEN: usize = 2000;
/// Maximum category name length, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TodoId {
    /// Local placeholder for an unreconciled create.
    Pending(u64),
    /// Row id assigned by the server.
    Persisted(i64),
}

impl TodoId {
    /// Decodes the wire representation: negative numbers are placeholders.
    pub fn from_wire(raw: i64) -> Self {
        if raw < 0 {
            TodoId::Pending(raw.unsigned_abs())
        } else {
            TodoId::Persisted(raw)
        }
    }

    /// Placeholders up to `2^63` encode losslessly; `Pending(2^63)` is
    /// `i64::MIN`.
    pub fn to_wire(self) -> i64 {
        match self {
            TodoId::Pending(local) => (local as i64).wrapping_neg(),
            TodoId::Persisted(id) => id,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, TodoId::Pending(_))
    }

    pub fn persisted(self) -> Option<i64> {
        match self {
            TodoId::Persisted(id) => Some(id),
            TodoId::Pending(_) => None,
        }
    }
}

impl From<i64> for TodoId {
    fn from(raw: i64) -> Self {
        TodoId::from_wire(raw)
    }
}

impl From<TodoId> for i64 {
    fn from(id: TodoId) -> Self {
        id.to_wire()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(TodoId::from_wire)
    }
}

/// A task as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub category_id: Option<i64>,
    pub order: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Builds the optimistic entry shown while a create is in flight.
    ///
    /// The owner is unknown client-side, so placeholders carry `owner_id = 0`,
    /// which never names a user row.
    pub fn placeholder(id: TodoId, input: &NewTodo) -> Self {
        let now = Utc::now();
        Self {
            id,
            text: input.text.trim().to_string(),
            completed: false,
            notes: input.notes.clone().filter(|n| !n.is_empty()),
            category_id: input.category_id,
            order: 0,
            owner_id: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Display order shared by the server query and every client cache:
/// `order` ascending, then newest first, then id descending.
pub fn display_order(a: &Todo, b: &Todo) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.to_wire().cmp(&a.id.to_wire()))
}

pub fn sort_for_display(todos: &mut [Todo]) {
    todos.sort_by(display_order);
}

/// Input of `todo.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl NewTodo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Partial update of a task (`data` of `todo.update`).
///
/// An empty `notes` string clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.notes.is_none() && self.completed.is_none()
    }

    /// Applies the patch to a cached task.
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(text) = &self.text {
            todo.text = text.trim().to_string();
        }
        if let Some(notes) = &self.notes {
            todo.notes = if notes.is_empty() { None } else { Some(notes.clone()) };
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = Utc::now();
    }
}

/// One entry of a reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: TodoId,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    #[default]
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl CategoryColor {
    pub const ALL: [CategoryColor; 8] = [
        CategoryColor::Gray,
        CategoryColor::Red,
        CategoryColor::Orange,
        CategoryColor::Yellow,
        CategoryColor::Green,
        CategoryColor::Blue,
        CategoryColor::Purple,
        CategoryColor::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryColor::Gray => "gray",
            CategoryColor::Red => "red",
            CategoryColor::Orange => "orange",
            CategoryColor::Yellow => "yellow",
            CategoryColor::Green => "green",
            CategoryColor::Blue => "blue",
            CategoryColor::Purple => "purple",
            CategoryColor::Pink => "pink",
        }
    }
}

impl fmt::Display for CategoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        CategoryColor::ALL
            .into_iter()
            .find(|color| color.as_str() == needle)
            .ok_or_else(|| Message::InvalidColor(s.to_string()).to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: CategoryColor,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub color: CategoryColor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<CategoryColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_encoding_distinguishes_placeholders() {
        assert_eq!(TodoId::from_wire(-1001), TodoId::Pending(1001));
        assert_eq!(TodoId::from_wire(42), TodoId::Persisted(42));
        assert_eq!(TodoId::Pending(1001).to_wire(), -1001);
        assert!(TodoId::Pending(7).persisted().is_none());
    }

    #[test]
    fn most_negative_wire_id_round_trips() {
        let id: TodoId = i64::MIN.to_string().parse().unwrap();
        assert_eq!(id, TodoId::Pending(1 << 63));
        assert_eq!(id.to_wire(), i64::MIN);
        assert_eq!(id.to_string(), "-9223372036854775808");
        assert_eq!(serde_json::to_string(&id).unwrap(), "-9223372036854775808");
        assert_eq!(TodoId::from_wire(id.to_wire()), id);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&ReorderItem {
            id: TodoId::Persisted(3),
            order: 1,
        })
        .unwrap();
        assert_eq!(json, r#"{"id":3,"order":1}"#);

        let item: ReorderItem = serde_json::from_str(r#"{"id":-5,"order":0}"#).unwrap();
        assert_eq!(item.id, TodoId::Pending(5));
    }

    #[test]
    fn empty_notes_clear_the_field() {
        let mut todo = Todo::placeholder(TodoId::Pending(1), &NewTodo::new("x").with_notes("keep"));
        TodoPatch {
            notes: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut todo);
        assert_eq!(todo.notes, None);
    }

    #[test]
    fn colors_parse_case_insensitively() {
        assert_eq!("Blue".parse::<CategoryColor>().unwrap(), CategoryColor::Blue);
        assert!("teal".parse::<CategoryColor>().is_err());
    }
}
