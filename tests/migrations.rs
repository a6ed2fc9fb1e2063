#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};
    use todosync::db::db::Db;
    use todosync::db::migrations::{get_db_version, init_with_migrations, needs_migration, MigrationManager};

    struct MigrationTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestContext for MigrationTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("todosync.db");
            MigrationTestContext {
                _temp_dir: temp_dir,
                db_path,
            }
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migrations_run_on_open(ctx: &mut MigrationTestContext) {
        let db = Db::open(&ctx.db_path).unwrap();

        assert_eq!(get_db_version(&db.conn).unwrap(), MigrationManager::new().latest_version());
        assert!(!needs_migration(&db.conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_fresh_database_needs_migration(ctx: &mut MigrationTestContext) {
        let conn = Connection::open(&ctx.db_path).unwrap();
        assert_eq!(get_db_version(&conn).unwrap(), 0);
        assert!(needs_migration(&conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migration_history_is_ordered(ctx: &mut MigrationTestContext) {
        let mut conn = Connection::open(&ctx.db_path).unwrap();
        let manager = MigrationManager::new();
        manager.run_migrations(&mut conn).unwrap();

        let history = manager.get_migration_history(&conn).unwrap();
        let names: Vec<_> = history.iter().map(|(_, name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["create_users", "create_categories", "create_todos"]);
        for (i, (version, _, _)) in history.iter().enumerate() {
            assert_eq!(*version as usize, i + 1);
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migrations_are_idempotent(ctx: &mut MigrationTestContext) {
        let mut conn = Connection::open(&ctx.db_path).unwrap();
        init_with_migrations(&mut conn).unwrap();
        init_with_migrations(&mut conn).unwrap();

        let manager = MigrationManager::new();
        assert_eq!(manager.get_migration_history(&conn).unwrap().len(), 3);
        assert!(manager.is_migration_applied(&conn, 3).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_reopening_keeps_data(ctx: &mut MigrationTestContext) {
        {
            let db = Db::open(&ctx.db_path).unwrap();
            db.conn
                .execute("INSERT INTO users (subject, created_at) VALUES ('alice', '2024-01-01 00:00:00+00:00')", [])
                .unwrap();
        }

        let db = Db::open(&ctx.db_path).unwrap();
        let count: i64 = db.conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
