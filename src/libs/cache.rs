//! Per-surface query cache of the task list.
//!
//! The cache holds the owner's tasks in display order. Local optimistic
//! writes go through [`QueryCache::mutate`]; authoritative state arrives
//! through [`QueryCache::invalidate`], which refetches every page.
//!
//! Refetches are coalesced: a call made while another refetch is running
//! returns immediately and the running one makes one more pass before it
//! finishes. A refetch whose request overlapped a local write is discarded
//! and re-run, and a refetch that lands while a write is still waiting for
//! the server is dropped in favour of that write's own settle refetch. A
//! response that predates an optimistic change therefore never overwrites
//! it.

use crate::api::procedures::ListInput;
use crate::api::RpcClient;
use crate::libs::error::RpcResult;
use crate::libs::todo::{sort_for_display, Todo, TodoId};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::{debug, trace};

pub struct QueryCache {
    client: RpcClient,
    page_size: u32,
    entries: RwLock<Vec<Todo>>,
    /// Bumped by every local write.
    epoch: AtomicU64,
    /// Bumped by every invalidation request.
    requested: AtomicU64,
    writes_in_flight: AtomicUsize,
    in_flight: Mutex<()>,
    changes: watch::Sender<u64>,
}

impl QueryCache {
    pub fn new(client: RpcClient, page_size: u32) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            client,
            page_size: page_size.clamp(1, 100),
            entries: RwLock::new(Vec::new()),
            epoch: AtomicU64::new(0),
            requested: AtomicU64::new(0),
            writes_in_flight: AtomicUsize::new(0),
            in_flight: Mutex::new(()),
            changes,
        }
    }

    pub fn snapshot(&self) -> Vec<Todo> {
        self.entries.read().clone()
    }

    /// Open tasks, in display order.
    pub fn pending(&self) -> Vec<Todo> {
        self.entries.read().iter().filter(|todo| !todo.completed).cloned().collect()
    }

    pub fn completed(&self) -> Vec<Todo> {
        self.entries.read().iter().filter(|todo| todo.completed).cloned().collect()
    }

    pub fn find(&self, id: TodoId) -> Option<Todo> {
        self.entries.read().iter().find(|todo| todo.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Render counter; changes whenever the cached list does.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Applies a local write, restores display order and notifies
    /// subscribers.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Todo>) -> R) -> R {
        let result = {
            let mut entries = self.entries.write();
            let result = f(&mut entries);
            sort_for_display(&mut entries);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            result
        };
        self.notify();
        result
    }

    /// Marks a write as waiting for the server until the guard is dropped.
    /// Dropping the guard also counts as a local write, so a refetch that
    /// started before the server answered is discarded.
    pub fn track_write(&self) -> WriteGuard<'_> {
        self.writes_in_flight.fetch_add(1, Ordering::SeqCst);
        WriteGuard { cache: self }
    }

    /// Refetches the full list from the server.
    pub async fn invalidate(&self) -> RpcResult<()> {
        self.requested.fetch_add(1, Ordering::SeqCst);

        loop {
            let Ok(guard) = self.in_flight.try_lock() else {
                trace!("refetch coalesced into the one in flight");
                return Ok(());
            };
            let target = self.requested.load(Ordering::SeqCst);
            let epoch = self.epoch.load(Ordering::SeqCst);

            let filter = ListInput {
                limit: self.page_size,
                ..ListInput::default()
            };
            let todos = self.client.list_all(&filter).await?;

            if self.writes_in_flight.load(Ordering::SeqCst) > 0 {
                debug!("refetch dropped, a write is still in flight");
                return Ok(());
            }
            if self.epoch.load(Ordering::SeqCst) == epoch {
                self.replace(todos);
            } else {
                debug!("discarding refetch that overlapped a local write");
                drop(guard);
                continue;
            }

            drop(guard);
            if self.requested.load(Ordering::SeqCst) == target {
                return Ok(());
            }
        }
    }

    fn replace(&self, mut todos: Vec<Todo>) {
        sort_for_display(&mut todos);
        *self.entries.write() = todos;
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|counter| *counter += 1);
    }
}

pub struct WriteGuard<'a> {
    cache: &'a QueryCache,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.cache.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
