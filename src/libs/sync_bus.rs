//! Cross-window invalidation bus.
//!
//! Surfaces never exchange task data with each other. After a mutation
//! settles, the surface publishes a payload-free [`SyncSignal`]; every
//! *other* surface reacts by refetching its list from the server.
//!
//! Two transports implement [`NotificationTransport`]:
//!
//! - [`BroadcastTransport`]: named same-origin channels backed by
//!   `tokio::sync::broadcast`. Every publish goes out as the generic
//!   `todo-sync` signal.
//! - [`IpcTransport`]: renderers send named events (`todo-created`,
//!   `todo-updated`, `todo-deleted`) to an [`IpcHost`], which re-emits them to
//!   every other connected renderer.
//!
//! The transport is picked once at startup by [`SyncEnvironment`].

use crate::libs::config::ClientConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};

/// Channel name used by the web shell.
pub const SYNC_CHANNEL: &str = "todosync";

const BROADCAST_CAPACITY: usize = 64;
const IPC_INBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncSignal {
    TodoCreated,
    TodoUpdated,
    TodoDeleted,
    /// Generic "something changed" used by the broadcast transport.
    TodoSync,
}

impl SyncSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncSignal::TodoCreated => "todo-created",
            SyncSignal::TodoUpdated => "todo-updated",
            SyncSignal::TodoDeleted => "todo-deleted",
            SyncSignal::TodoSync => "todo-sync",
        }
    }
}

impl fmt::Display for SyncSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-unique identity of one surface on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

impl SurfaceId {
    pub fn next() -> Self {
        SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Envelope {
    origin: SurfaceId,
    signal: SyncSignal,
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// The surface this transport publishes for.
    fn origin(&self) -> SurfaceId;

    async fn publish(&self, signal: SyncSignal) -> Result<()>;

    /// Signals published by other surfaces from now on.
    fn subscribe(&self) -> Subscription;
}

/// Receiving end of a transport.
pub struct Subscription {
    inner: SubscriptionInner,
}

enum SubscriptionInner {
    Broadcast {
        origin: SurfaceId,
        rx: broadcast::Receiver<Envelope>,
    },
    Ipc {
        rx: mpsc::UnboundedReceiver<SyncSignal>,
    },
}

impl Subscription {
    /// Waits for the next foreign signal. `None` once the transport is gone.
    pub async fn recv(&mut self) -> Option<SyncSignal> {
        match &mut self.inner {
            SubscriptionInner::Broadcast { origin, rx } => loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.origin == *origin => continue,
                    Ok(envelope) => return Some(envelope.signal),
                    // Missed signals collapse into one invalidation.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "sync subscription lagged");
                        return Some(SyncSignal::TodoSync);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
            SubscriptionInner::Ipc { rx } => rx.recv().await,
        }
    }

    /// Discards signals that are already queued and returns how many were
    /// dropped. Used to fold a burst into the refetch that is about to run.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        match &mut self.inner {
            SubscriptionInner::Broadcast { origin, rx } => loop {
                match rx.try_recv() {
                    Ok(envelope) if envelope.origin == *origin => continue,
                    Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => drained += 1,
                    Err(_) => break,
                }
            },
            SubscriptionInner::Ipc { rx } => {
                while rx.try_recv().is_ok() {
                    drained += 1;
                }
            }
        }
        drained
    }
}

/// Registry of named same-origin channels.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `channel` as a new surface.
    pub fn join(&self, channel: &str) -> BroadcastTransport {
        let sender = self
            .channels
            .lock()
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone();

        BroadcastTransport {
            origin: SurfaceId::next(),
            channel: channel.to_string(),
            sender,
        }
    }
}

pub struct BroadcastTransport {
    origin: SurfaceId,
    channel: String,
    sender: broadcast::Sender<Envelope>,
}

#[async_trait]
impl NotificationTransport for BroadcastTransport {
    fn origin(&self) -> SurfaceId {
        self.origin
    }

    async fn publish(&self, signal: SyncSignal) -> Result<()> {
        trace!(surface = %self.origin, channel = %self.channel, requested = %signal, "broadcast todo-sync");
        // No receivers just means no other surface is open.
        let _ = self.sender.send(Envelope {
            origin: self.origin,
            signal: SyncSignal::TodoSync,
        });
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription {
            inner: SubscriptionInner::Broadcast {
                origin: self.origin,
                rx: self.sender.subscribe(),
            },
        }
    }
}

type Renderers = Arc<Mutex<HashMap<SurfaceId, Vec<mpsc::UnboundedSender<SyncSignal>>>>>;

/// Host-side relay of the desktop shell.
///
/// Every event a renderer sends is re-emitted to all other renderers. The
/// relay task ends once the host and every transport are dropped.
#[derive(Clone)]
pub struct IpcHost {
    inbound: mpsc::Sender<Envelope>,
    renderers: Renderers,
}

impl IpcHost {
    /// Spawns the relay task on the current tokio runtime.
    pub fn start() -> Self {
        let (inbound, mut rx) = mpsc::channel::<Envelope>(IPC_INBOUND_CAPACITY);
        let renderers: Renderers = Arc::default();

        let relay = renderers.clone();
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let mut renderers = relay.lock();
                for (surface, senders) in renderers.iter_mut() {
                    if *surface == envelope.origin {
                        continue;
                    }
                    senders.retain(|tx| tx.send(envelope.signal).is_ok());
                }
                renderers.retain(|_, senders| !senders.is_empty());
                trace!(from = %envelope.origin, signal = %envelope.signal, "relayed ipc event");
            }
            debug!("ipc relay stopped");
        });

        Self { inbound, renderers }
    }

    /// Connects a new renderer.
    pub fn connect(&self) -> IpcTransport {
        IpcTransport {
            origin: SurfaceId::next(),
            host: self.clone(),
        }
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.lock().len()
    }
}

pub struct IpcTransport {
    origin: SurfaceId,
    host: IpcHost,
}

#[async_trait]
impl NotificationTransport for IpcTransport {
    fn origin(&self) -> SurfaceId {
        self.origin
    }

    async fn publish(&self, signal: SyncSignal) -> Result<()> {
        self.host
            .inbound
            .send(Envelope {
                origin: self.origin,
                signal,
            })
            .await
            .map_err(|_| anyhow!("ipc host is gone"))
    }

    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.host.renderers.lock().entry(self.origin).or_default().push(tx);
        Subscription {
            inner: SubscriptionInner::Ipc { rx },
        }
    }
}

/// The shell a surface runs in, which decides the bus transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    #[default]
    Web,
    Desktop,
}

impl ShellKind {
    /// `TODOSYNC_SHELL` first, then the client configuration, then `web`.
    pub fn detect(config: Option<&ClientConfig>) -> Self {
        env::var("TODOSYNC_SHELL")
            .ok()
            .and_then(|shell| shell.parse().ok())
            .or_else(|| config.map(|c| c.shell))
            .unwrap_or_default()
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellKind::Web => write!(f, "web"),
            ShellKind::Desktop => write!(f, "desktop"),
        }
    }
}

impl FromStr for ShellKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web" | "browser" => Ok(ShellKind::Web),
            "desktop" | "native" => Ok(ShellKind::Desktop),
            other => Err(format!("unknown shell '{}'", other)),
        }
    }
}

/// The bus chosen for this process. Every surface asks it for its own
/// transport so that all of them share one hub or one host.
#[derive(Clone)]
pub enum SyncEnvironment {
    Web { hub: BroadcastHub, channel: String },
    Desktop { host: IpcHost },
}

impl SyncEnvironment {
    /// Must be called inside a tokio runtime when the shell is `desktop`.
    pub fn for_shell(shell: ShellKind) -> Self {
        match shell {
            ShellKind::Web => SyncEnvironment::Web {
                hub: BroadcastHub::new(),
                channel: SYNC_CHANNEL.to_string(),
            },
            ShellKind::Desktop => SyncEnvironment::Desktop { host: IpcHost::start() },
        }
    }

    pub fn detect(config: Option<&ClientConfig>) -> Self {
        Self::for_shell(ShellKind::detect(config))
    }

    pub fn shell(&self) -> ShellKind {
        match self {
            SyncEnvironment::Web { .. } => ShellKind::Web,
            SyncEnvironment::Desktop { .. } => ShellKind::Desktop,
        }
    }

    pub fn transport_for(&self) -> Arc<dyn NotificationTransport> {
        match self {
            SyncEnvironment::Web { hub, channel } => Arc::new(hub.join(channel)),
            SyncEnvironment::Desktop { host } => Arc::new(host.connect()),
        }
    }
}
