//! Client side of the RPC boundary.
//!
//! [`RpcTransport`] moves one JSON request to the server and back. Two
//! transports exist: [`http::HttpTransport`] for a remote server and
//! [`local::LocalTransport`] for a router embedded in the same process.
//! [`RpcClient`] wraps a transport with typed calls and carries the caller's
//! credential.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::api::RpcClient;
//! use todosync::libs::config::ClientConfig;
//! use todosync::libs::todo::NewTodo;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = RpcClient::from_config(&ClientConfig::default())?;
//! let todo = client.create(&NewTodo::new("Buy milk")).await?;
//! client.toggle(todo.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod local;
pub mod procedures;

use crate::libs::config::ClientConfig;
use crate::libs::error::{RpcError, RpcResult};
use crate::libs::todo::{Category, CategoryPatch, NewCategory, NewTodo, ReorderItem, Todo, TodoId, TodoPatch};
use async_trait::async_trait;
use procedures::{
    CategoryIdInput, CategoryUpdateInput, ClearCompletedOutput, IdInput, ListInput, ListOutput, NoInput, Procedure, ReorderInput,
    SuccessOutput, UpdateInput,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// One request/response exchange with the task store.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, procedure: Procedure, credential: Option<&str>, input: Value) -> RpcResult<Value>;
}

#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    credential: Option<String>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport, credential: None }
    }

    /// Bearer token sent with every call.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// HTTP client for the configured server.
    pub fn from_config(config: &ClientConfig) -> RpcResult<Self> {
        let transport = http::HttpTransport::new(&config.api_url, Duration::from_secs(config.request_timeout_secs))?;
        let mut client = Self::new(Arc::new(transport));
        client.credential = config.auth_token.clone();
        Ok(client)
    }

    pub async fn call<I, O>(&self, procedure: Procedure, input: &I) -> RpcResult<O>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input).map_err(|e| RpcError::BadRequest(e.to_string()))?;
        let output = self.transport.call(procedure, self.credential.as_deref(), input).await?;
        serde_json::from_value(output).map_err(|e| RpcError::Internal(format!("unexpected {} response: {}", procedure, e)))
    }

    pub async fn list(&self, input: &ListInput) -> RpcResult<ListOutput> {
        self.call(Procedure::TodoList, input).await
    }

    /// Every task matching `filter`, following `nextOffset` until the last
    /// page. The `offset` of `filter` is ignored.
    pub async fn list_all(&self, filter: &ListInput) -> RpcResult<Vec<Todo>> {
        let mut input = ListInput { offset: 0, ..*filter };
        let mut todos = Vec::new();
        loop {
            let page = self.list(&input).await?;
            todos.extend(page.todos);
            match page.next_offset {
                Some(next) if page.has_more && next > input.offset => input.offset = next,
                _ => break,
            }
        }
        Ok(todos)
    }

    pub async fn create(&self, input: &NewTodo) -> RpcResult<Todo> {
        self.call(Procedure::TodoCreate, input).await
    }

    /// `None` when the server treated the call as a no-op.
    pub async fn update(&self, id: TodoId, patch: &TodoPatch) -> RpcResult<Option<Todo>> {
        let input = UpdateInput { id, data: patch.clone() };
        self.call(Procedure::TodoUpdate, &input).await
    }

    pub async fn toggle(&self, id: TodoId) -> RpcResult<Option<Todo>> {
        self.call(Procedure::TodoToggle, &IdInput { id }).await
    }

    pub async fn delete(&self, id: TodoId) -> RpcResult<bool> {
        let output: SuccessOutput = self.call(Procedure::TodoDelete, &IdInput { id }).await?;
        Ok(output.success)
    }

    pub async fn clear_completed(&self) -> RpcResult<u64> {
        let output: ClearCompletedOutput = self.call(Procedure::TodoClearCompleted, &NoInput {}).await?;
        Ok(output.deleted_count)
    }

    pub async fn reorder(&self, items: &[ReorderItem]) -> RpcResult<bool> {
        let input = ReorderInput { items: items.to_vec() };
        let output: SuccessOutput = self.call(Procedure::TodoReorder, &input).await?;
        Ok(output.success)
    }

    pub async fn categories(&self) -> RpcResult<Vec<Category>> {
        self.call(Procedure::CategoryList, &NoInput {}).await
    }

    pub async fn create_category(&self, input: &NewCategory) -> RpcResult<Category> {
        self.call(Procedure::CategoryCreate, input).await
    }

    pub async fn update_category(&self, id: i64, patch: &CategoryPatch) -> RpcResult<Category> {
        let input = CategoryUpdateInput { id, data: patch.clone() };
        self.call(Procedure::CategoryUpdate, &input).await
    }

    pub async fn delete_category(&self, id: i64) -> RpcResult<bool> {
        let output: SuccessOutput = self.call(Procedure::CategoryDelete, &CategoryIdInput { id }).await?;
        Ok(output.success)
    }
}
