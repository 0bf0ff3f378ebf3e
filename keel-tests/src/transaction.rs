use keel::{Database, FieldDef, KeelError, Model, Query, Value};
use std::sync::{Arc, Mutex};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn transaction(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Transaction lock is poisoned");
    let ledger = Model::builder("Ledger")
        .table("transaction_ledger")
        .database(database.clone())
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("amount", FieldDef::integer())
        .register()
        .expect("Failed to register Ledger");
    for statement in [
        "DROP TABLE IF EXISTS transaction_ledger",
        "CREATE TABLE transaction_ledger (id INTEGER PRIMARY KEY, amount INTEGER NOT NULL)",
    ] {
        ledger
            .raw(statement, Vec::new())
            .execute()
            .expect(format!("Failed to execute `{}`", statement).as_str());
    }
    ledger
        .create([("id", 1), ("amount", 100)])
        .expect("Failed to create the first entry");

    // The second row collides with the first one, the whole statement is rolled back
    let error = ledger
        .insert_many(
            ["id", "amount"],
            vec![
                vec![Value::from(2), Value::from(50)],
                vec![Value::from(1), Value::from(75)],
            ],
        )
        .expect("Valid bulk insert")
        .execute()
        .expect_err("The primary key is duplicated");
    let Some(KeelError::Database {
        statement,
        parameters,
        ..
    }) = error.downcast_ref::<KeelError>()
    else {
        panic!("Expected a database error, got {:#}", error);
    };
    assert!(statement.starts_with("INSERT INTO transaction_ledger"));
    assert_eq!(parameters.len(), 4);
    assert_eq!(ledger.select().count().expect("Failed to count"), 1);

    let error = ledger
        .raw("INSERT INTO transaction_missing (id) VALUES (?)", vec![Value::from(1)])
        .execute()
        .expect_err("The table does not exist");
    assert!(matches!(
        error.downcast_ref::<KeelError>(),
        Some(KeelError::Database { .. })
    ));

    assert_eq!(
        ledger
            .update([("amount", 120)])
            .filter_by([("id", 1)])
            .expect("Valid filter")
            .execute()
            .expect("Failed to update the amount"),
        1
    );
    assert_eq!(
        ledger
            .get([("id", 1)])
            .expect("The first entry must exist")
            .get_as::<i64>("amount")
            .expect("Amount"),
        120
    );
}
