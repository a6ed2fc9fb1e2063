//! HTTP front of the task store.
//!
//! Every procedure is served as `POST /rpc/<procedure>` with a JSON body;
//! an empty body counts as `null`. The response is the procedure's JSON
//! output, or an [`RpcError`] with the matching status code. `GET /health`
//! reports the service name and version.
//!
//! Credentials come from `Authorization: Bearer <token>`. Handlers run on
//! the blocking pool since the router serialises access to one SQLite
//! connection.

use super::auth::Authenticator;
use super::handlers::TodoRouter;
use crate::api::procedures::Procedure;
use crate::db::db::Db;
use crate::libs::config::{AuthMode, ServerConfig};
use crate::libs::error::RpcError;
use crate::libs::messages::Message;
use crate::{msg_info, msg_warning};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Routes, CORS and request tracing around `router`.
pub fn app(router: Arc<TodoRouter>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/:procedure", post(rpc))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(router)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": APP_METADATA_NAME,
        "version": APP_METADATA_VERSION,
    }))
}

async fn rpc(
    State(router): State<Arc<TodoRouter>>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, RpcError> {
    let procedure: Procedure = procedure.parse()?;
    debug!(%procedure, mutation = procedure.is_mutation(), "rpc call");
    let credential = bearer_token(&headers)?;
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| RpcError::BadRequest(format!("malformed body: {}", e)))?
    };

    let output = tokio::task::spawn_blocking(move || router.dispatch(credential.as_deref(), procedure, input))
        .await
        .map_err(|e| RpcError::Internal(format!("handler panicked: {}", e)))?;

    if let Err(err) = &output {
        if !err.is_not_found() {
            warn!(%procedure, error = %err, "rpc failed");
        }
    }
    output.map(Json)
}

/// Extracts the token of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, RpcError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| RpcError::Unauthorized("authorization header is not valid text".into()))?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(RpcError::Unauthorized("only bearer credentials are accepted".into()));
    }
    Ok(Some(token.trim().to_string()))
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Arc<TodoRouter>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(router)).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Opens the store and serves it on `config.bind` until Ctrl-C or SIGTERM.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let db = match &config.database {
        Some(path) => Db::open(path)?,
        None => Db::new()?,
    };
    let auth = Authenticator::from_config(config)?;
    if auth.mode() == AuthMode::Mock {
        msg_warning!(Message::MockAuthEnabled);
    }

    let listener = TcpListener::bind(&config.bind).await?;
    msg_info!(Message::ServerListening(listener.local_addr()?.to_string()));

    serve(listener, Arc::new(TodoRouter::new(db, auth)), shutdown_signal()).await?;
    msg_info!(Message::ServerStopped);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
