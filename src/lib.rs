//! # todosync - one task list, many windows
//!
//! An authoritative task store behind a small RPC surface, and the client
//! engine every window uses to render it: optimistic mutations, drag-style
//! reordering and cross-window invalidation.
//!
//! ## Features
//!
//! - **Task Store**: Per-owner tasks and categories in SQLite, with migrations
//! - **RPC Surface**: Named procedures over HTTP (axum) or in-process
//! - **Optimistic Mutations**: Instant local feedback, reconciled with the server
//! - **Reordering**: Move one pending task onto another's place
//! - **Cross-Window Sync**: Broadcast channel in the web shell, IPC relay in the desktop shell
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
pub mod server;
