//! Optimistic mutation layer.
//!
//! Each operation changes the local cache before the request leaves, then
//! reconciles with the server's answer. Every operation ends in a *settle*
//! step whatever the outcome: an authoritative refetch followed by a sync
//! signal for the other surfaces. A failed request is rolled back by that
//! refetch; the error itself is returned only to the caller.

use crate::api::RpcClient;
use crate::libs::cache::QueryCache;
use crate::libs::error::RpcResult;
use crate::libs::reorder::{apply_plan, plan_reorder};
use crate::libs::sync_bus::{NotificationTransport, SyncSignal};
use crate::libs::todo::{NewTodo, Todo, TodoId, TodoPatch};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of [`TodoId::Pending`] values for one surface.
///
/// Seeded from the current time in milliseconds so that placeholders of a
/// reopened surface do not repeat, and strictly increasing afterwards.
#[derive(Debug)]
pub struct PlaceholderIds {
    next: AtomicU64,
}

impl PlaceholderIds {
    pub fn new() -> Self {
        Self::with_seed(Utc::now().timestamp_millis().max(1) as u64)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed.max(1)),
        }
    }

    pub fn next(&self) -> TodoId {
        TodoId::Pending(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PlaceholderIds {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct Mutations {
    cache: Arc<QueryCache>,
    client: RpcClient,
    bus: Arc<dyn NotificationTransport>,
    ids: Arc<PlaceholderIds>,
}

impl Mutations {
    pub fn new(cache: Arc<QueryCache>, client: RpcClient, bus: Arc<dyn NotificationTransport>, ids: Arc<PlaceholderIds>) -> Self {
        Self { cache, client, bus, ids }
    }

    /// Shows a placeholder immediately and swaps it for the server's task
    /// once the create succeeds.
    pub async fn create(&self, input: NewTodo) -> RpcResult<Todo> {
        let placeholder_id = self.ids.next();
        let placeholder = Todo::placeholder(placeholder_id, &input);
        self.cache.mutate(|todos| todos.push(placeholder));

        let write = self.cache.track_write();
        let result = self.client.create(&input).await;
        match &result {
            Ok(todo) => {
                debug!(placeholder = %placeholder_id, id = %todo.id, "placeholder reconciled");
                self.cache.mutate(|todos| {
                    todos.retain(|entry| entry.id != placeholder_id && entry.id != todo.id);
                    todos.push(todo.clone());
                });
            }
            Err(e) => {
                warn!(placeholder = %placeholder_id, error = %e, "create failed");
                self.cache.mutate(|todos| todos.retain(|entry| entry.id != placeholder_id));
            }
        }
        drop(write);

        self.settle(SyncSignal::TodoCreated).await;
        result
    }

    /// `Ok(None)` when the server ignored the call (pending id) or the task
    /// was deleted elsewhere.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> RpcResult<Option<Todo>> {
        self.cache.mutate(|todos| {
            if let Some(entry) = todos.iter_mut().find(|entry| entry.id == id) {
                patch.apply(entry);
            }
        });

        let write = self.cache.track_write();
        let result = self.client.update(id, &patch).await;
        let result = self.reconcile(id, result);
        drop(write);

        self.settle(SyncSignal::TodoUpdated).await;
        result
    }

    pub async fn toggle(&self, id: TodoId) -> RpcResult<Option<Todo>> {
        self.cache.mutate(|todos| {
            if let Some(entry) = todos.iter_mut().find(|entry| entry.id == id) {
                entry.completed = !entry.completed;
                entry.updated_at = Utc::now();
            }
        });

        let write = self.cache.track_write();
        let result = self.client.toggle(id).await;
        let result = self.reconcile(id, result);
        drop(write);

        self.settle(SyncSignal::TodoUpdated).await;
        result
    }

    /// Removing a task that is already gone is not an error.
    pub async fn delete(&self, id: TodoId) -> RpcResult<()> {
        self.cache.mutate(|todos| todos.retain(|entry| entry.id != id));

        let write = self.cache.track_write();
        let result = match self.client.delete(id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(%id, "already deleted elsewhere");
                Ok(())
            }
            Err(e) => Err(e),
        };
        drop(write);

        self.settle(SyncSignal::TodoDeleted).await;
        result
    }

    /// Returns how many tasks the server removed.
    pub async fn clear_completed(&self) -> RpcResult<u64> {
        self.cache.mutate(|todos| todos.retain(|entry| !entry.completed));

        let write = self.cache.track_write();
        let result = self.client.clear_completed().await;
        drop(write);

        self.settle(SyncSignal::TodoDeleted).await;
        result
    }

    /// Drops `active` onto `over` in the pending list.
    ///
    /// Returns `Ok(false)` without contacting the server when the move is a
    /// no-op. Placeholders are reordered locally, but the server skips them,
    /// so their position is lost if they reconcile after this call.
    pub async fn reorder(&self, active: TodoId, over: TodoId) -> RpcResult<bool> {
        let Some(plan) = plan_reorder(&self.cache.pending(), active, over) else {
            return Ok(false);
        };
        self.cache.mutate(|todos| apply_plan(todos, &plan));

        let write = self.cache.track_write();
        let result = self.client.reorder(&plan).await;
        drop(write);

        self.settle(SyncSignal::TodoUpdated).await;
        result.map(|_| true)
    }

    fn reconcile(&self, id: TodoId, result: RpcResult<Option<Todo>>) -> RpcResult<Option<Todo>> {
        match result {
            Ok(Some(todo)) => {
                self.cache.mutate(|todos| {
                    if let Some(entry) = todos.iter_mut().find(|entry| entry.id == id) {
                        *entry = todo.clone();
                    }
                });
                Ok(Some(todo))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => {
                debug!(%id, "deleted elsewhere, dropping local entry");
                self.cache.mutate(|todos| todos.retain(|entry| entry.id != id));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn settle(&self, signal: SyncSignal) {
        if let Err(e) = self.cache.invalidate().await {
            warn!(surface = %self.bus.origin(), error = %e, "settle refetch failed");
        }
        if let Err(e) = self.bus.publish(signal).await {
            warn!(surface = %self.bus.origin(), %signal, error = %e, "sync publish failed");
        }
    }
}
