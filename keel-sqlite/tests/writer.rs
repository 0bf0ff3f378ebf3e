#[cfg(test)]
mod tests {
    use keel_core::{FieldDef, Model, Query, SqlWriter, Value};
    use keel_sqlite::SqliteSqlWriter;

    fn model() -> Model {
        Model::builder("Note")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("body", FieldDef::varchar())
            .register()
            .unwrap()
    }

    #[test]
    fn sqlite_dialect() {
        let writer = SqliteSqlWriter::new();
        let note = model();
        let (sql, parameters) = note
            .select()
            .filter_by([("body__startswith", "to")])
            .unwrap()
            .offset(3)
            .sql_with(&writer)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT id, body FROM note WHERE (body LIKE ?) LIMIT -1 OFFSET 3"
        );
        assert_eq!(parameters, [Value::from("to%")]);
        let (sql, _) = note.select().page(3, 2).sql_with(&writer).unwrap();
        assert_eq!(sql, "SELECT id, body FROM note LIMIT 2 OFFSET 3");
        let (sql, _) = note.select().limit(4).sql_with(&writer).unwrap();
        assert_eq!(sql, "SELECT id, body FROM note LIMIT 4");

        let mut out = String::new();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "BEGIN");
        out.clear();
        writer.write_transaction_rollback(&mut out);
        assert_eq!(out, "ROLLBACK");
    }
}
