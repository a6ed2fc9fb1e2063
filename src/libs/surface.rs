//! A window rendering the task list.
//!
//! A surface owns its own cache, mutation layer and bus subscription. It
//! shares nothing with other surfaces except the server and the bus.

use crate::api::RpcClient;
use crate::libs::cache::QueryCache;
use crate::libs::config::DEFAULT_PAGE_SIZE;
use crate::libs::error::RpcResult;
use crate::libs::mutation::{Mutations, PlaceholderIds};
use crate::libs::sync_bus::{NotificationTransport, SurfaceId};
use crate::libs::todo::{Todo, TodoId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// The main window.
    Main,
    /// A floating navigator window.
    Floating,
}

#[derive(Debug, Clone, Copy)]
pub struct SurfaceOptions {
    pub page_size: u32,
    /// Fixed first placeholder id instead of the time-based seed.
    pub placeholder_seed: Option<u64>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            placeholder_seed: None,
        }
    }
}

pub struct Surface {
    kind: SurfaceKind,
    id: SurfaceId,
    cache: Arc<QueryCache>,
    mutations: Mutations,
    listener: JoinHandle<()>,
}

impl Surface {
    pub async fn open(kind: SurfaceKind, client: RpcClient, transport: Arc<dyn NotificationTransport>) -> RpcResult<Self> {
        Self::open_with(kind, client, transport, SurfaceOptions::default()).await
    }

    /// Fetches the initial list and starts listening for sync signals.
    pub async fn open_with(
        kind: SurfaceKind,
        client: RpcClient,
        transport: Arc<dyn NotificationTransport>,
        options: SurfaceOptions,
    ) -> RpcResult<Self> {
        let id = transport.origin();
        let cache = Arc::new(QueryCache::new(client.clone(), options.page_size));

        // Subscribe first so nothing published during the initial fetch is missed.
        let mut subscription = transport.subscribe();
        cache.invalidate().await?;

        let listener = tokio::spawn({
            let cache = cache.clone();
            async move {
                while let Some(signal) = subscription.recv().await {
                    let folded = subscription.drain();
                    debug!(surface = %id, %signal, folded, "sync signal received");
                    if let Err(e) = cache.invalidate().await {
                        warn!(surface = %id, error = %e, "refetch after sync signal failed");
                    }
                }
                debug!(surface = %id, "sync subscription closed");
            }
        });

        let ids = match options.placeholder_seed {
            Some(seed) => PlaceholderIds::with_seed(seed),
            None => PlaceholderIds::new(),
        };
        let mutations = Mutations::new(cache.clone(), client, transport, Arc::new(ids));
        info!(surface = %id, ?kind, todos = cache.len(), "surface opened");

        Ok(Self {
            kind,
            id,
            cache,
            mutations,
            listener,
        })
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.cache.snapshot()
    }

    pub fn pending(&self) -> Vec<Todo> {
        self.cache.pending()
    }

    pub fn completed(&self) -> Vec<Todo> {
        self.cache.completed()
    }

    pub fn find(&self, id: TodoId) -> Option<Todo> {
        self.cache.find(id)
    }

    pub fn changes(&self) -> watch::Receiver<u64> {
        self.cache.changes()
    }

    pub async fn refresh(&self) -> RpcResult<()> {
        self.cache.invalidate().await
    }

    /// Waits until the rendered list satisfies `predicate`. Returns `false`
    /// on timeout.
    pub async fn wait_until<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: Fn(&[Todo]) -> bool,
    {
        let mut changes = self.cache.changes();
        let settled = async {
            loop {
                if predicate(&self.cache.snapshot()) {
                    return;
                }
                if changes.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::time::timeout(timeout, settled).await.is_ok()
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
