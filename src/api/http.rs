use super::procedures::Procedure;
use super::RpcTransport;
use crate::libs::error::{RpcError, RpcResult};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// `POST {api_url}/rpc/{procedure}` with a JSON body.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> RpcResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", APP_METADATA_NAME, APP_METADATA_VERSION))
            .build()
            .map_err(|e| RpcError::Internal(format!("cannot build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, procedure: Procedure) -> String {
        format!("{}/rpc/{}", self.base_url, procedure)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, procedure: Procedure, credential: Option<&str>, input: Value) -> RpcResult<Value> {
        let mut request = self.client.post(self.url(procedure)).json(&input);
        if let Some(token) = credential {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let res = request.send().await?;
        let status = res.status();
        debug!(%procedure, status = status.as_u16(), "rpc response");

        if status.is_success() {
            return Ok(res.json::<Value>().await?);
        }

        let body = res.text().await.unwrap_or_default();
        Err(serde_json::from_str::<RpcError>(&body).unwrap_or_else(|_| RpcError::from_status(status.as_u16(), &body)))
    }
}
