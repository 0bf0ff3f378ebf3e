use keel::{Database, FieldDef, KeelError, Model, Operand, Query, Value};
use std::sync::{Arc, Mutex};
use time::macros::date;

static MUTEX: Mutex<()> = Mutex::new(());

pub fn operations(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Operations lock is poisoned");
    let measure = Model::builder("Measure")
        .table("operations_measure")
        .database(database.clone())
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("label", FieldDef::varchar().max_length(20))
        .field("amount", FieldDef::integer())
        .field("ratio", FieldDef::float().nullable().expect("Valid nullable field"))
        .field("active", FieldDef::boolean().default(true))
        .field("taken", FieldDef::date().nullable().expect("Valid nullable field"))
        .register()
        .expect("Failed to register Measure");
    for statement in [
        "DROP TABLE IF EXISTS operations_measure",
        "CREATE TABLE operations_measure (id INTEGER PRIMARY KEY, label VARCHAR(20) NOT NULL, amount INTEGER NOT NULL, ratio REAL, active INTEGER NOT NULL, taken DATE)",
    ] {
        measure
            .raw(statement, Vec::new())
            .execute()
            .expect(format!("Failed to execute `{}`", statement).as_str());
    }

    let rows: [(i64, &str, i64, Option<f64>, bool); 4] = [
        (1, "alpha", 10, Some(0.5), true),
        (2, "Beta", 20, None, false),
        (3, "gamma", 30, Some(1.5), true),
        (4, "alphabet", 40, None, true),
    ];
    for (id, label, amount, ratio, active) in rows {
        measure
            .insert([
                ("id", Value::from(id)),
                ("label", label.into()),
                ("amount", amount.into()),
                ("ratio", ratio.into()),
                ("active", active.into()),
            ])
            .expect("Valid insert")
            .execute()
            .expect("Failed to insert a measure");
    }

    let count = |filters: Vec<(&str, Operand)>| {
        measure
            .select()
            .filter_by(filters)
            .expect("Valid filters")
            .count()
            .expect("Failed to count")
    };
    assert_eq!(count(vec![]), 4);
    assert_eq!(count(vec![("amount__in", [10, 30].into())]), 2);
    assert_eq!(count(vec![("amount__nin", [10, 30].into())]), 2);
    assert_eq!(count(vec![("amount__between", [15, 35].into())]), 2);
    assert_eq!(count(vec![("amount__ne", 10.into())]), 3);
    assert_eq!(count(vec![("amount__lt", 20.into())]), 1);
    assert_eq!(count(vec![("amount__lte", 20.into())]), 2);
    assert_eq!(count(vec![("amount__gt", 20.into())]), 2);
    assert_eq!(count(vec![("amount__gte", 20.into())]), 3);
    assert_eq!(count(vec![("ratio__isnull", true.into())]), 2);
    assert_eq!(count(vec![("ratio__isnull", false.into())]), 2);
    assert_eq!(count(vec![("ratio", Option::<f64>::None.into())]), 2);
    assert_eq!(count(vec![("label__startswith", "alpha".into())]), 2);
    assert_eq!(count(vec![("label__contains", "amm".into())]), 1);
    assert_eq!(count(vec![("label__ieq", "BETA".into())]), 1);
    assert_eq!(count(vec![("label__icontains", "ALPHA".into())]), 2);
    assert_eq!(count(vec![("label__istartswith", "GAM".into())]), 1);
    assert_eq!(
        count(vec![("amount__gt", 10.into()), ("active", true.into())]),
        2
    );
    // Unknown fields do not restrict the result
    assert_eq!(count(vec![("weight", 10.into())]), 4);

    let error = measure
        .select()
        .filter_by([("ratio__is", 1.5)])
        .expect_err("The is operator only accepts null");
    assert!(matches!(
        error.downcast_ref::<KeelError>(),
        Some(KeelError::Validation(..))
    ));

    // Conditions
    let amount = measure.field("amount").expect("Amount field").clone();
    let count_where = |condition: keel::Condition| {
        measure
            .select()
            .filter(condition)
            .count()
            .expect("Failed to count")
    };
    assert_eq!(count_where((!amount.lt(30)).into()), 2);
    assert_eq!(
        count_where(amount.equals(10).or(amount.equals(40)).into()),
        2
    );
    assert_eq!(
        count_where((!amount.equals(10).or(amount.equals(40))).into()),
        2
    );
    assert_eq!(
        count_where(
            amount
                .between(15, 45)
                .expect("Valid bounds")
                .and(!amount.equals(30))
                .into()
        ),
        2
    );
    let active = measure
        .select()
        .filter_by([("active", true)])
        .expect("Valid filter");
    let id = measure.field("id").expect("Id field").clone();
    assert_eq!(count_where(id.in_(active.clone()).into()), 3);
    assert_eq!(count_where(id.not_in(active).into()), 1);

    // Ordering
    let largest = measure
        .select()
        .sort(["-amount"])
        .first()
        .expect("There must be a measure");
    assert_eq!(largest.get_as::<i64>("amount").expect("Amount"), 40);
    let labels = measure
        .select()
        .sort(["label"])
        .execute()
        .expect("Failed to query")
        .map(|v| v.and_then(|v| v.get_as::<String>("label")))
        .collect::<keel::Result<Vec<_>>>()
        .expect("Failed to read the labels");
    assert_eq!(labels, ["Beta", "alpha", "alphabet", "gamma"]);

    // Round trips
    let mut beta = measure.get([("id", 2)]).expect("Measure 2 must exist");
    assert!(!beta.get_as::<bool>("active").expect("Active"));
    assert_eq!(beta.get_as::<Option<f64>>("ratio").expect("Ratio"), None);
    beta.set("taken", date!(2024 - 02 - 29)).expect("Valid date");
    beta.set("active", true).expect("Valid boolean");
    beta.save().expect("Failed to save measure 2");
    let beta = measure.get([("id", 2)]).expect("Measure 2 must exist");
    assert!(beta.get_as::<bool>("active").expect("Active"));
    assert_eq!(
        beta.get_as::<time::Date>("taken").expect("Taken"),
        date!(2024 - 02 - 29)
    );
    assert_eq!(
        measure
            .select()
            .filter_by([("taken__isnull", false)])
            .expect("Valid filter")
            .count()
            .expect("Failed to count"),
        1
    );
}
