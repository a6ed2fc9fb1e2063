use super::todo::{connect, report, ClientArgs};
use crate::{
    libs::{
        messages::Message,
        todo::{CategoryColor, CategoryPatch, NewCategory},
        view::View,
    },
    msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    /// Show all categories
    List,
    /// Create a category
    Add {
        name: String,
        #[arg(short, long, default_value_t = CategoryColor::default())]
        color: CategoryColor,
    },
    /// Rename or recolor a category
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        color: Option<CategoryColor>,
    },
    /// Delete a category; its tasks become uncategorized
    Rm { id: i64 },
}

pub async fn cmd(args: CategoryArgs) -> Result<()> {
    let (client, _) = connect(&args.client)?;

    match args.command {
        CategoryCommand::List => {
            let categories = client.categories().await.map_err(report)?;
            if categories.is_empty() {
                msg_info!(Message::CategoriesNotFound);
            } else {
                View::categories(&categories)?;
            }
        }
        CategoryCommand::Add { name, color } => {
            let category = client.create_category(&NewCategory { name, color }).await.map_err(report)?;
            msg_success!(Message::CategoryCreated(category.name));
        }
        CategoryCommand::Edit { id, name, color } => {
            if name.is_none() && color.is_none() {
                msg_warning!(Message::NothingToUpdate);
                return Ok(());
            }
            let category = client
                .update_category(id, &CategoryPatch { name, color })
                .await
                .map_err(report)?;
            msg_success!(Message::CategoryUpdated(category.name));
        }
        CategoryCommand::Rm { id } => {
            client.delete_category(id).await.map_err(report)?;
            msg_success!(Message::CategoryDeleted(id));
        }
    }

    Ok(())
}
