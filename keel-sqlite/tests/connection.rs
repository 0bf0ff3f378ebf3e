#[cfg(test)]
mod tests {
    use keel_core::{Backend, Database};
    use keel_sqlite::SqliteBackend;
    use keel_tests::{init_logs, silent_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let mut backend = SqliteBackend::new(format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not parse the connection url");
        backend.connect().expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        let mut backend = SqliteBackend::new(format!("sqlite://{}?mode=ro", DB_PATH))
            .expect("Could not parse the connection url");
        backend.connect().expect("Could not open the database");
        backend.close().expect("Could not close the database");
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            let database = Database::new(
                SqliteBackend::new(format!("sqlite://{}?mode=ro", DB_PATH))
                    .expect("Could not parse the connection url"),
            );
            assert!(
                database.connect().is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteBackend::new("postgres://some_value").is_err());
            assert!(SqliteBackend::new("sqlite://some_value?mode=everything").is_err());
        };
    }
}
