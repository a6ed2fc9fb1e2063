//! Command-line interface.
//!
//! `serve` runs the authoritative store. The task commands open one surface
//! against it (or against an embedded router with `--embedded`) and go
//! through the same optimistic mutation layer a window would.

pub mod category;
pub mod init;
pub mod migrations;
pub mod serve;
pub mod todo;
pub mod token;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Run the task store server")]
    Serve(serve::ServeArgs),
    #[command(about = "Issue a signed bearer token", arg_required_else_help = true)]
    Token(token::TokenArgs),
    #[command(about = "Show tasks in display order")]
    List(todo::ListArgs),
    #[command(about = "Create a task", arg_required_else_help = true)]
    Add(todo::AddArgs),
    #[command(about = "Change a task's text or notes", arg_required_else_help = true)]
    Edit(todo::EditArgs),
    #[command(about = "Toggle a task's completion", arg_required_else_help = true)]
    Done(todo::IdArgs),
    #[command(about = "Delete a task", arg_required_else_help = true)]
    Rm(todo::IdArgs),
    #[command(about = "Delete all completed tasks")]
    Clear(todo::ClearArgs),
    #[command(about = "Move a task onto another one's place", arg_required_else_help = true)]
    Mv(todo::MoveArgs),
    #[command(about = "Manage categories", arg_required_else_help = true)]
    Category(category::CategoryArgs),
    #[command(about = "Database migration status")]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Serve(args) => serve::cmd(args).await,
            Commands::Token(args) => token::cmd(args),
            Commands::List(args) => todo::list(args).await,
            Commands::Add(args) => todo::add(args).await,
            Commands::Edit(args) => todo::edit(args).await,
            Commands::Done(args) => todo::done(args).await,
            Commands::Rm(args) => todo::rm(args).await,
            Commands::Clear(args) => todo::clear(args).await,
            Commands::Mv(args) => todo::mv(args).await,
            Commands::Category(args) => category::cmd(args).await,
            Commands::Migrations(args) => migrations::cmd(args),
        }
    }
}
