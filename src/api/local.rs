use super::procedures::Procedure;
use super::RpcTransport;
use crate::libs::error::{RpcError, RpcResult};
use crate::server::handlers::TodoRouter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Dispatches straight into a [`TodoRouter`] living in this process.
///
/// Used when the desktop shell embeds the store, and by tests. An optional
/// latency is awaited before every call so that optimistic state can be
/// observed while a request is "in flight". The router holds a blocking
/// connection lock, so dispatch runs on the blocking pool like the HTTP
/// handler does.
#[derive(Clone)]
pub struct LocalTransport {
    router: Arc<TodoRouter>,
    latency: Option<Duration>,
}

impl LocalTransport {
    pub fn new(router: Arc<TodoRouter>) -> Self {
        Self { router, latency: None }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl RpcTransport for LocalTransport {
    async fn call(&self, procedure: Procedure, credential: Option<&str>, input: Value) -> RpcResult<Value> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let router = Arc::clone(&self.router);
        let credential = credential.map(str::to_owned);
        tokio::task::spawn_blocking(move || router.dispatch(credential.as_deref(), procedure, input))
            .await
            .map_err(|e| RpcError::Internal(format!("handler panicked: {}", e)))?
    }
}
