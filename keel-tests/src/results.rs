use keel::{Database, FieldDef, KeelError, Model, Query, Value};
use std::sync::{Arc, Mutex};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn results(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Results lock is poisoned");
    let entry = Model::builder("Entry")
        .table("results_entry")
        .database(database.clone())
        .ordering(["id"])
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("name", FieldDef::varchar())
        .register()
        .expect("Failed to register Entry");
    for statement in [
        "DROP TABLE IF EXISTS results_entry",
        "CREATE TABLE results_entry (id INTEGER PRIMARY KEY, name VARCHAR(3000) NOT NULL)",
    ] {
        entry
            .raw(statement, Vec::new())
            .execute()
            .expect(format!("Failed to execute `{}`", statement).as_str());
    }
    entry
        .insert_many(
            ["id", "name"],
            vec![
                vec![1.into(), "first".into()],
                vec![2.into(), "second".into()],
                vec![3.into(), "third".into()],
            ],
        )
        .expect("Valid bulk insert")
        .execute()
        .expect("Failed to insert the entries");

    // Cache and replay
    let mut result = entry.select().execute().expect("Failed to query");
    result.cache(true);
    assert!(matches!(
        result.replay().map_err(|e| e.downcast::<KeelError>()),
        Err(Ok(KeelError::ResultUnavailable(..)))
    ));
    let read = result
        .by_ref()
        .collect::<keel::Result<Vec<_>>>()
        .expect("Failed to read the entries");
    assert_eq!(read.len(), 3);
    assert!(!result.is_open());
    let replayed = result.replay().expect("The entries must be cached");
    assert_eq!(replayed, read.as_slice());
    let mut result = entry.select().execute().expect("Failed to query");
    result.by_ref().for_each(drop);
    assert!(result.replay().is_err());

    // Scoped iteration closes the cursor early
    let mut result = entry.select().execute().expect("Failed to query");
    {
        let mut scoped = result.scoped();
        let first = scoped
            .next()
            .expect("There must be a first entry")
            .expect("Failed to read the first entry");
        assert_eq!(first.get_as::<String>("name").expect("Name"), "first");
        assert!(scoped.is_open());
    }
    assert!(!result.is_open());
    assert!(result.next().is_none());

    // Raw statements materialize naively
    let raw = entry
        .raw(
            "SELECT id, name FROM results_entry WHERE id > ? ORDER BY id",
            vec![Value::from(1)],
        )
        .execute()
        .expect("Failed to run the raw query");
    assert!(raw.is_naive());
    let names = raw
        .map(|v| v.and_then(|v| v.get_as::<String>("name")))
        .collect::<keel::Result<Vec<_>>>()
        .expect("Failed to read the raw rows");
    assert_eq!(names, ["second", "third"]);

    // Distinct selection
    let distinct = entry
        .select()
        .distinct(true)
        .fields(["name"])
        .execute()
        .expect("Failed to query")
        .collect_all()
        .expect("Failed to read the entries");
    assert_eq!(distinct.len(), 3);
    assert!(distinct.iter().all(|v| v.pk().is_none()));
}
