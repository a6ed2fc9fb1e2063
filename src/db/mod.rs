//! SQLite persistence for the authoritative task store.
//!
//! Every repository here is owner-scoped: the `owner_id` of the calling user
//! is part of each statement, so a row owned by someone else behaves exactly
//! like a row that does not exist.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::db::{db::Db, todos::Todos, users::Users};
//! use todosync::libs::todo::NewTodo;
//!
//! let mut db = Db::in_memory()?;
//! let owner = Users::new(&db.conn).upsert("mock-user", None)?;
//! let todo = Todos::new(&mut db.conn).insert(owner, &NewTodo::new("Buy milk"))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection management and schema initialisation.
pub mod db;

/// Versioned schema migrations.
pub mod migrations;

/// Per-owner categories.
pub mod categories;

/// Per-owner tasks, including the transactional reorder.
pub mod todos;

/// Owners, created on first authenticated contact.
pub mod users;
