use crate::{
    db::{
        db::Db,
        migrations::{get_db_version, needs_migration, report_status, MigrationManager},
    },
    libs::messages::Message,
    msg_info, msg_print,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Show current database version
    Status,
    /// Show migration history
    History,
}

pub fn cmd(args: MigrationsArgs) -> Result<()> {
    let conn = Db::new_without_migrations()?;

    match args.command {
        MigrationsCommand::Status => {
            if needs_migration(&conn)? {
                msg_print!(Message::DatabaseVersion(get_db_version(&conn)?));
                msg_info!(Message::DatabaseNeedsUpdate);
            } else {
                report_status(&conn)?;
                msg_info!(Message::DatabaseUpToDate);
            }
        }
        MigrationsCommand::History => {
            msg_print!(Message::MigrationHistory, true);
            for (version, name, applied_at) in MigrationManager::new().get_migration_history(&conn)? {
                msg_print!(Message::MigrationHistoryEntry(version, name, applied_at));
            }
        }
    }

    Ok(())
}
