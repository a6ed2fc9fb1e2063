#[derive(Debug, Clone)]
pub enum Message {
    // === TODO MESSAGES ===
    TodoCreated(String, String), // id, text
    TodoUpdated(String),         // id
    TodoToggled(String, bool),   // id, completed
    TodoDeleted(String),         // id
    TodoNotFound(String),        // id
    TodoIgnoredPending(String),  // id
    TodosNotFound,
    TodosHeader(usize, usize), // pending, completed
    CompletedCleared(u64),
    NoCompletedTodos,
    ConfirmClearCompleted(usize),
    NothingToUpdate,
    TodoReordered(String, String), // active, over
    ReorderNoOp,

    // === CATEGORY MESSAGES ===
    CategoryCreated(String),
    CategoryUpdated(String),
    CategoryDeleted(i64),
    CategoriesNotFound,
    InvalidColor(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNotFound,
    ConfigModuleServer,
    ConfigModuleClient,
    PromptSelectModules,
    PromptServerBind,
    PromptServerDatabase,
    PromptAuthMode,
    PromptJwtSecret,
    PromptApiUrl,
    PromptAuthToken,
    PromptRequestTimeout,
    PromptPageSize,
    PromptShell,

    // === SERVER MESSAGES ===
    ServerListening(String),
    ServerStopped,
    MockAuthEnabled,
    JwtSecretMissing,
    TokenIssued(String, i64), // subject, ttl hours

    // === CLIENT MESSAGES ===
    RequestFailed(String),
    RequestFailedRetryable(String),
    Unauthorized(String),
    SyncTransport(String), // shell

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String),
    MigrationFailed(u32, String),
    AllMigrationsCompleted,
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory,
    MigrationHistoryEntry(u32, String, String), // version, name, applied at
}
