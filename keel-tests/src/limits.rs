use keel::{Database, FieldDef, Model, Query, Value};
use std::sync::{Arc, Mutex};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn limits(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Limits lock is poisoned");
    let counter = Model::builder("Counter")
        .table("limits_counter")
        .database(database.clone())
        .ordering(["id"])
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("value", FieldDef::integer())
        .register()
        .expect("Failed to register Counter");
    for statement in [
        "DROP TABLE IF EXISTS limits_counter",
        "CREATE TABLE limits_counter (id INTEGER PRIMARY KEY, value INTEGER NOT NULL)",
    ] {
        counter
            .raw(statement, Vec::new())
            .execute()
            .expect(format!("Failed to execute `{}`", statement).as_str());
    }
    counter
        .insert_many(
            ["id", "value"],
            (1..=10)
                .map(|v: i64| vec![Value::from(v), Value::from(v * 10)])
                .collect(),
        )
        .expect("Valid bulk insert")
        .execute()
        .expect("Failed to insert the counters");

    let ids = |query: keel::SelectQuery| {
        query
            .execute()
            .expect("Failed to query the counters")
            .map(|v| v.and_then(|v| v.get_as::<i64>("id")))
            .collect::<keel::Result<Vec<_>>>()
            .expect("Failed to read the counters")
    };
    assert_eq!(ids(counter.select()), (1..=10).collect::<Vec<i64>>());
    assert_eq!(ids(counter.select().limit(3)), [1, 2, 3]);
    assert_eq!(ids(counter.select().offset(8)), [9, 10]);
    assert_eq!(ids(counter.select().page(2, 3)), [3, 4, 5]);
    assert_eq!(ids(counter.select().limit(0)).len(), 10);
    assert_eq!(ids(counter.select().sort_force(["-id"]).limit(2)), [10, 9]);
    assert_eq!(
        counter
            .select()
            .limit(4)
            .count()
            .expect("Failed to count"),
        4
    );
}
