//! Text of every user-facing [`Message`].

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TODO MESSAGES ===
            Message::TodoCreated(id, text) => format!("Task {} created: {}", id, text),
            Message::TodoUpdated(id) => format!("Task {} updated", id),
            Message::TodoToggled(id, completed) => {
                if *completed {
                    format!("Task {} marked as done", id)
                } else {
                    format!("Task {} reopened", id)
                }
            }
            Message::TodoDeleted(id) => format!("Task {} deleted", id),
            Message::TodoNotFound(id) => format!("Task {} not found", id),
            Message::TodoIgnoredPending(id) => format!("Task {} has not been saved yet, nothing to do", id),
            Message::TodosNotFound => "No tasks yet".to_string(),
            Message::TodosHeader(pending, completed) => format!("Tasks: {} open, {} done", pending, completed),
            Message::CompletedCleared(count) => format!("Removed {} completed tasks", count),
            Message::NoCompletedTodos => "There are no completed tasks".to_string(),
            Message::ConfirmClearCompleted(count) => format!("Remove {} completed tasks?", count),
            Message::NothingToUpdate => "Nothing to update, pass --text or --notes".to_string(),
            Message::TodoReordered(active, over) => format!("Moved task {} to the position of task {}", active, over),
            Message::ReorderNoOp => "Order unchanged".to_string(),

            // === CATEGORY MESSAGES ===
            Message::CategoryCreated(name) => format!("Category '{}' created", name),
            Message::CategoryUpdated(name) => format!("Category '{}' updated", name),
            Message::CategoryDeleted(id) => format!("Category {} deleted, its tasks were kept", id),
            Message::CategoriesNotFound => "No categories yet".to_string(),
            Message::InvalidColor(color) => format!(
                "Unknown color '{}', use one of: gray, red, orange, yellow, green, blue, purple, pink",
                color
            ),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::ConfigNotFound => "No configuration file to remove".to_string(),
            Message::ConfigModuleServer => "Server".to_string(),
            Message::ConfigModuleClient => "Client".to_string(),
            Message::PromptSelectModules => "Select the sections to configure".to_string(),
            Message::PromptServerBind => "Listen address".to_string(),
            Message::PromptServerDatabase => "Database file (empty for the default location)".to_string(),
            Message::PromptAuthMode => "Authentication mode".to_string(),
            Message::PromptJwtSecret => "JWT signing secret".to_string(),
            Message::PromptApiUrl => "Server URL".to_string(),
            Message::PromptAuthToken => "Bearer token (empty for none)".to_string(),
            Message::PromptRequestTimeout => "Request timeout in seconds".to_string(),
            Message::PromptPageSize => "Page size (1-100)".to_string(),
            Message::PromptShell => "Window shell".to_string(),

            // === SERVER MESSAGES ===
            Message::ServerListening(addr) => format!("Listening on http://{}", addr),
            Message::ServerStopped => "Server stopped".to_string(),
            Message::MockAuthEnabled => "Mock authentication is enabled, every request is trusted".to_string(),
            Message::JwtSecretMissing => "Auth mode 'jwt' needs server.jwtSecret or TODOSYNC_JWT_SECRET".to_string(),
            Message::TokenIssued(subject, hours) => format!("Token for '{}', valid for {} hours:", subject, hours),

            // === CLIENT MESSAGES ===
            Message::RequestFailed(error) => format!("Request failed: {}", error),
            Message::RequestFailedRetryable(error) => format!("Request failed: {}. The server may be busy or unreachable; run the command again to retry", error),
            Message::Unauthorized(error) => format!("Not authorized: {}. Check client.authToken", error),
            Message::SyncTransport(shell) => format!("Sync bus transport: {}", shell),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DatabaseVersion(version) => format!("Current database version: {}", version),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database schema needs to be updated".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
            Message::MigrationHistoryEntry(version, name, applied_at) => format!("  v{}: {} (applied: {})", version, name, applied_at),
        };

        write!(f, "{}", text)
    }
}
