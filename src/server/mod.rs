//! Server side of the RPC boundary: identity, the procedure router and the
//! HTTP front end.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use todosync::db::db::Db;
//! use todosync::server::{auth::Authenticator, handlers::TodoRouter, http};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let router = Arc::new(TodoRouter::new(Db::in_memory()?, Authenticator::mock()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//! http::serve(listener, router, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod handlers;
pub mod http;
