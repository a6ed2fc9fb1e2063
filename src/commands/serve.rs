use crate::{
    libs::config::{AuthMode, Config},
    server,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 127.0.0.1:4100
    #[arg(short, long)]
    bind: Option<String>,
    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
    /// Trust every request instead of verifying bearer tokens
    #[arg(long)]
    mock: bool,
}

pub async fn cmd(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?.server_or_default();
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.database.is_some() {
        config.database = args.database;
    }
    if args.mock {
        config.auth_mode = AuthMode::Mock;
    }

    server::http::run(&config).await
}
