#[cfg(test)]
mod tests {
    use keel_core::Database;
    use keel_sqlite::SqliteBackend;
    use keel_tests::{execute_tests, init_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let backend = SqliteBackend::new(format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not parse the connection url");
        let database = Database::new(backend);
        assert!(database.connect().expect("Could not open the database"));
        assert!(!database.connect().expect("Could not reuse the connection"));
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        execute_tests(database);
    }

    #[test]
    fn sqlite_memory() {
        init_logs();
        let database = Database::new(
            SqliteBackend::new("sqlite://:memory:").expect("Could not parse the connection url"),
        );
        execute_tests(database.clone());
        assert!(database.is_active());
        database.close().expect("Could not close the database");
        assert!(!database.is_active());
    }
}
