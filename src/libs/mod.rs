//! Core library modules for todosync.
//!
//! ## Features
//!
//! - **Core Infrastructure**: Configuration, data storage, messaging, logging
//! - **Domain Model**: Tasks, categories, display order
//! - **Client Engine**: Query cache, optimistic mutations, reorder planning
//! - **Synchronization**: Notification transports and window surfaces
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::api::RpcClient;
//! use todosync::libs::config::ClientConfig;
//! use todosync::libs::surface::{Surface, SurfaceKind};
//! use todosync::libs::sync_bus::SyncEnvironment;
//! use todosync::libs::todo::TodoId;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = RpcClient::from_config(&ClientConfig::default())?;
//! let environment = SyncEnvironment::detect(None);
//! let surface = Surface::open(SurfaceKind::Main, client, environment.transport_for()).await?;
//! surface.mutations().reorder(TodoId::Persisted(3), TodoId::Persisted(7)).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod logging;
pub mod messages;
pub mod mutation;
pub mod reorder;
pub mod surface;
pub mod sync_bus;
pub mod todo;
pub mod view;
