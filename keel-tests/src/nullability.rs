use keel::{Database, FieldDef, KeelError, Model, Query, Value};
use std::sync::{Arc, Mutex};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn nullability(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Nullability lock is poisoned");
    let profile = Model::builder("Profile")
        .table("nullability_profile")
        .database(database.clone())
        .auto_increment(true)
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("nickname", FieldDef::varchar().max_length(8))
        .field("age", FieldDef::integer().nullable().expect("Valid nullable field"))
        .field("score", FieldDef::float().default(0.0))
        .register()
        .expect("Failed to register Profile");
    for statement in [
        "DROP TABLE IF EXISTS nullability_profile",
        "CREATE TABLE nullability_profile (id INTEGER PRIMARY KEY, nickname VARCHAR(8) NOT NULL, age INTEGER, score REAL NOT NULL)",
    ] {
        profile
            .raw(statement, Vec::new())
            .execute()
            .expect(format!("Failed to execute `{}`", statement).as_str());
    }

    let mut anonymous = profile
        .create([("nickname", Value::from("anonymous_user")), ("age", Value::Null)])
        .expect("Failed to create the profile");
    let id = anonymous.pk().cloned().expect("The generated id must be assigned");
    let stored = profile.get([("id", id.clone())]).expect("The profile must exist");
    // Text is truncated to the maximum length when stored
    assert_eq!(stored.get_as::<String>("nickname").expect("Nickname"), "anonymou");
    assert_eq!(stored.get_as::<Option<i64>>("age").expect("Age"), None);
    assert_eq!(stored.get_as::<f64>("score").expect("Score"), 0.0);

    let error = profile
        .update([("nickname", Value::Null)])
        .filter_by([("id", id.clone())])
        .expect("Valid filter")
        .execute()
        .expect_err("Nickname is not nullable");
    assert!(matches!(
        error.downcast_ref::<KeelError>(),
        Some(KeelError::Validation(..))
    ));

    assert_eq!(
        profile
            .update([("age", 31)])
            .filter_by([("id", id.clone())])
            .expect("Valid filter")
            .execute()
            .expect("Failed to update the age"),
        1
    );
    anonymous.refresh(&[]).expect("Failed to refresh the profile");
    assert_eq!(anonymous.get_as::<Option<i64>>("age").expect("Age"), Some(31));
    assert_eq!(anonymous.dirty_fields().count(), 0);

    assert_eq!(
        profile
            .update([("age", Value::Null)])
            .filter_by([("id", id.clone())])
            .expect("Valid filter")
            .execute()
            .expect("Failed to clear the age"),
        1
    );
    assert_eq!(
        profile
            .select()
            .filter_by([("age__isnull", true)])
            .expect("Valid filter")
            .count()
            .expect("Failed to count"),
        1
    );
}
