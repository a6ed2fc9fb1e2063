use crate::{
    api::{local::LocalTransport, RpcClient},
    db::db::Db,
    libs::{
        config::{ClientConfig, Config},
        error::RpcError,
        messages::Message,
        surface::{Surface, SurfaceKind, SurfaceOptions},
        sync_bus::SyncEnvironment,
        todo::{NewTodo, TodoId, TodoPatch},
        view::View,
    },
    msg_debug, msg_error_anyhow, msg_info, msg_print, msg_success, msg_warning,
    server::{auth::Authenticator, handlers::TodoRouter},
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::sync::Arc;

/// Options shared by every command that talks to the task store.
#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Use the local database directly instead of the configured server
    #[arg(long)]
    embedded: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only completed tasks
    #[arg(long, conflicts_with = "pending")]
    completed: bool,
    /// Only open tasks
    #[arg(long)]
    pending: bool,
    /// Only tasks of this category
    #[arg(long)]
    category: Option<i64>,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(required = true)]
    text: String,
    #[arg(short, long)]
    notes: Option<String>,
    #[arg(short, long)]
    category: Option<i64>,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(allow_negative_numbers = true)]
    id: TodoId,
    #[arg(short, long)]
    text: Option<String>,
    /// New notes; an empty string clears them
    #[arg(short, long)]
    notes: Option<String>,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(allow_negative_numbers = true)]
    id: TodoId,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Task being dragged
    #[arg(allow_negative_numbers = true)]
    active: TodoId,
    /// Task it is dropped onto
    #[arg(allow_negative_numbers = true)]
    over: TodoId,
    #[command(flatten)]
    client: ClientArgs,
}

/// RPC client for the configured server, or for an embedded router over the
/// local database.
pub fn connect(args: &ClientArgs) -> Result<(RpcClient, ClientConfig)> {
    let config = Config::load()?;
    let client_config = config.client_or_default();

    let client = if args.embedded {
        let auth = Authenticator::from_config(&config.server_or_default())?;
        let router = TodoRouter::new(Db::new()?, auth);
        let client = RpcClient::new(Arc::new(LocalTransport::new(Arc::new(router))));
        match &client_config.auth_token {
            Some(token) => client.with_credential(token.clone()),
            None => client,
        }
    } else {
        RpcClient::from_config(&client_config).map_err(report)?
    };

    Ok((client, client_config))
}

async fn open_surface(args: &ClientArgs) -> Result<(Surface, RpcClient)> {
    let (client, client_config) = connect(args)?;
    let environment = SyncEnvironment::detect(Some(&client_config));
    msg_debug!(Message::SyncTransport(environment.shell().to_string()));

    let options = SurfaceOptions {
        page_size: client_config.page_size,
        ..SurfaceOptions::default()
    };
    let surface = Surface::open_with(SurfaceKind::Main, client.clone(), environment.transport_for(), options)
        .await
        .map_err(report)?;
    Ok((surface, client))
}

/// Turns an RPC failure into a user-facing error. Infrastructure failures
/// tell the user the command can be retried.
pub fn report(err: RpcError) -> anyhow::Error {
    match err {
        RpcError::Unauthorized(reason) => msg_error_anyhow!(Message::Unauthorized(reason)),
        other if other.is_retryable() => msg_error_anyhow!(Message::RequestFailedRetryable(other.to_string())),
        other => msg_error_anyhow!(Message::RequestFailed(other.to_string())),
    }
}

pub async fn list(args: ListArgs) -> Result<()> {
    let (surface, client) = open_surface(&args.client).await?;
    let categories = client.categories().await.map_err(report)?;

    let todos: Vec<_> = surface
        .todos()
        .into_iter()
        .filter(|todo| !args.completed || todo.completed)
        .filter(|todo| !args.pending || !todo.completed)
        .filter(|todo| args.category.is_none() || todo.category_id == args.category)
        .collect();

    if todos.is_empty() {
        msg_info!(Message::TodosNotFound);
        return Ok(());
    }

    msg_print!(Message::TodosHeader(surface.pending().len(), surface.completed().len()), true);
    View::todos(&todos, &categories)
}

pub async fn add(args: AddArgs) -> Result<()> {
    let (surface, _) = open_surface(&args.client).await?;

    let mut input = NewTodo::new(args.text);
    input.notes = args.notes;
    input.category_id = args.category;

    let todo = surface.mutations().create(input).await.map_err(report)?;
    msg_success!(Message::TodoCreated(todo.id.to_string(), todo.text));
    Ok(())
}

pub async fn edit(args: EditArgs) -> Result<()> {
    let patch = TodoPatch {
        text: args.text,
        notes: args.notes,
        completed: None,
    };
    if patch.is_empty() {
        msg_warning!(Message::NothingToUpdate);
        return Ok(());
    }

    let (surface, _) = open_surface(&args.client).await?;
    match surface.mutations().update(args.id, patch).await.map_err(report)? {
        Some(todo) => msg_success!(Message::TodoUpdated(todo.id.to_string())),
        None => not_applied(args.id),
    }
    Ok(())
}

pub async fn done(args: IdArgs) -> Result<()> {
    let (surface, _) = open_surface(&args.client).await?;
    match surface.mutations().toggle(args.id).await.map_err(report)? {
        Some(todo) => msg_success!(Message::TodoToggled(todo.id.to_string(), todo.completed)),
        None => not_applied(args.id),
    }
    Ok(())
}

pub async fn rm(args: IdArgs) -> Result<()> {
    let (surface, _) = open_surface(&args.client).await?;
    surface.mutations().delete(args.id).await.map_err(report)?;
    msg_success!(Message::TodoDeleted(args.id.to_string()));
    Ok(())
}

pub async fn clear(args: ClearArgs) -> Result<()> {
    let (surface, _) = open_surface(&args.client).await?;
    let count = surface.completed().len();
    if count == 0 {
        msg_info!(Message::NoCompletedTodos);
        return Ok(());
    }

    if !args.yes
        && !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmClearCompleted(count).to_string())
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    let deleted = surface.mutations().clear_completed().await.map_err(report)?;
    msg_success!(Message::CompletedCleared(deleted));
    Ok(())
}

pub async fn mv(args: MoveArgs) -> Result<()> {
    let (surface, _) = open_surface(&args.client).await?;
    if surface.mutations().reorder(args.active, args.over).await.map_err(report)? {
        msg_success!(Message::TodoReordered(args.active.to_string(), args.over.to_string()));
    } else {
        msg_info!(Message::ReorderNoOp);
    }
    Ok(())
}

fn not_applied(id: TodoId) {
    if id.is_pending() {
        msg_info!(Message::TodoIgnoredPending(id.to_string()));
    } else {
        msg_warning!(Message::TodoNotFound(id.to_string()));
    }
}
