#[cfg(test)]
mod tests {
    use indoc::indoc;
    use keel::{
        Database, FieldDef, JoinType, KeelError, Model, OracleSqlWriter, Query, Session, Value,
        collapse_whitespace,
    };
    use keel_tests::{Recorder, RecordingBackend, init_logs, silent_logs};
    use std::sync::Arc;

    fn models(database: &Arc<Database>) -> (Model, Model) {
        let author = Model::builder("Author")
            .database(database.clone())
            .auto_increment(true)
            .field("id", FieldDef::integer().primary().unwrap())
            .field("name", FieldDef::varchar())
            .register()
            .unwrap();
        let book = Model::builder("Book")
            .database(database.clone())
            .auto_increment(true)
            .field("id", FieldDef::integer().primary().unwrap())
            .field("author_id", FieldDef::foreign_key(&author))
            .field("title", FieldDef::varchar())
            .register()
            .unwrap();
        (author, book)
    }

    fn setup() -> (Arc<Database>, Recorder, Model, Model) {
        init_logs();
        let (backend, recorder) = RecordingBackend::new();
        let database = Database::new(backend);
        let (author, book) = models(&database);
        (database, recorder, author, book)
    }

    #[test]
    fn write_transaction() {
        let (database, recorder, author, _) = setup();
        assert_eq!(database.name(), "recording");
        recorder.set_last_insert_id(7);
        let tolkien = author.create([("name", "Tolkien")]).unwrap();
        assert_eq!(tolkien.pk(), Some(&Value::from(7)));
        assert!(!tolkien.is_new());
        assert_eq!(
            recorder.events(),
            ["connect", "begin", "cursor write", "commit", "cursor closed"]
        );
        assert_eq!(
            recorder.executed(),
            [(
                "INSERT INTO author (name) VALUES (?)".to_string(),
                vec![Value::from("Tolkien")]
            )]
        );

        // A failing statement rolls back and reports the statement
        recorder.clear();
        recorder.push_error("constraint failed");
        let error;
        silent_logs! {
            error = author
                .update([("name", "Le Guin")])
                .filter_by([("id", 7)])
                .unwrap()
                .execute()
                .unwrap_err();
        }
        let Some(KeelError::Database {
            message,
            statement,
            parameters,
            native,
        }) = error.downcast_ref::<KeelError>()
        else {
            panic!("Expected a database error, got {:#}", error);
        };
        assert!(message.starts_with("constraint failed"));
        assert_eq!(native.to_string(), "constraint failed");
        assert_eq!(format!("{:#}", error).matches("constraint failed").count(), 1);
        assert_eq!(statement, "UPDATE author SET name = ? WHERE (id = ?)");
        assert_eq!(parameters, &[Value::from("Le Guin"), Value::from(7)]);
        assert_eq!(
            recorder.events(),
            ["begin", "cursor write", "cursor closed", "rollback"]
        );
    }

    #[test]
    fn graph_materialization() {
        let (_, recorder, author, book) = setup();
        recorder.push_rows(
            &["id", "author_id", "title", "id", "name"],
            vec![
                vec![
                    1.into(),
                    7.into(),
                    "The Hobbit".into(),
                    7.into(),
                    "Tolkien".into(),
                ],
                vec![
                    2.into(),
                    Value::Null,
                    "Beowulf".into(),
                    Value::Null,
                    Value::Null,
                ],
            ],
        );
        let result = book
            .select()
            .join(&author, JoinType::Left, None, None)
            .unwrap()
            .execute()
            .unwrap();
        assert!(!result.is_naive());
        let books = result.collect_all().unwrap();
        assert_eq!(
            recorder.statements(),
            [collapse_whitespace(indoc! {"
                SELECT t1.id, t1.author_id, t1.title, t2.id, t2.name
                FROM book t1
                LEFT OUTER JOIN author t2 ON t1.author_id = t2.id
            "})]
        );
        assert_eq!(books.len(), 2);
        let hobbit = &books[0];
        assert_eq!(hobbit.get_as::<String>("title").unwrap(), "The Hobbit");
        let tolkien = hobbit.related("author").unwrap();
        assert_eq!(tolkien.model(), &author);
        assert_eq!(tolkien.get_as::<String>("name").unwrap(), "Tolkien");
        assert!(!tolkien.is_new());
        assert!(books[1].related("author").is_none());
        assert_eq!(books[1].get_as::<Option<i64>>("author_id").unwrap(), None);
        assert_eq!(
            recorder.events(),
            ["connect", "cursor read", "cursor closed"]
        );
    }

    #[test]
    fn naive_materialization() {
        let (_, recorder, _, book) = setup();
        recorder.push_rows(
            &["id", "author_id", "title", "extra"],
            vec![vec![3.into(), 7.into(), "Silmarillion".into(), true.into()]],
        );
        let mut result = book.select().execute().unwrap();
        assert!(result.is_naive());
        let silmarillion = result.next().unwrap().unwrap();
        assert_eq!(silmarillion.pk(), Some(&Value::from(3)));
        assert_eq!(silmarillion.get_as::<i64>("author_id").unwrap(), 7);
        assert!(silmarillion.get("extra").is_none());
        assert!(result.is_open());
        assert!(result.next().is_none());
        assert!(!result.is_open());
    }

    #[test]
    fn single_objects() {
        let (_, recorder, author, book) = setup();
        let error = author.get([("name", "Nobody")]).unwrap_err();
        assert!(KeelError::is_no_data(&error));

        recorder.push_rows(&["count"], vec![vec![3.into()]]);
        assert_eq!(
            book.select()
                .filter_by([("title__contains", "Ring")])
                .unwrap()
                .count()
                .unwrap(),
            3
        );
        assert_eq!(
            recorder.executed().last().unwrap(),
            &(
                "SELECT COUNT(*) FROM (SELECT id, author_id, title FROM book WHERE (title LIKE ?)) AS t0"
                    .to_string(),
                vec![Value::from("%Ring%")]
            )
        );
        recorder.push_rows(&["count"], vec![vec![0.into()]]);
        assert!(!author.select().exists().unwrap());

        // Loaded instance, dirty fields only
        recorder.clear();
        recorder.push_rows(
            &["id", "author_id", "title"],
            vec![vec![1.into(), 7.into(), "The Hobit".into()]],
        );
        let mut hobbit = book.select().first().unwrap();
        assert_eq!(
            recorder.statements(),
            ["SELECT id, author_id, title FROM book LIMIT 1"]
        );
        hobbit.save().unwrap();
        assert_eq!(recorder.statements().len(), 1);
        hobbit.set("title", "The Hobbit").unwrap();
        hobbit.set("id", 1).unwrap();
        assert_eq!(hobbit.dirty_fields().collect::<Vec<_>>(), ["title"]);
        recorder.set_rows_affected(1);
        hobbit.save().unwrap();
        assert_eq!(
            recorder.executed().last().unwrap(),
            &(
                "UPDATE book SET title = ? WHERE (id = ?)".to_string(),
                vec![Value::from("The Hobbit"), Value::from(1)]
            )
        );
        assert_eq!(hobbit.dirty_fields().count(), 0);

        // Related objects are loaded on demand
        recorder.push_rows(&["id", "name"], vec![vec![7.into(), "Tolkien".into()]]);
        let tolkien = hobbit.fetch_related("author").unwrap().unwrap().clone();
        assert_eq!(
            recorder.executed().last().unwrap(),
            &(
                "SELECT id, name FROM author WHERE (id = ?)".to_string(),
                vec![Value::from(7)]
            )
        );
        let count = recorder.statements().len();
        assert!(hobbit.fetch_related("author_id").unwrap().is_some());
        assert_eq!(recorder.statements().len(), count);
        assert!(hobbit.fetch_related("publisher").is_err());
        assert_eq!(
            tolkien.reverse("book_set").unwrap().sql().unwrap(),
            (
                "SELECT id, author_id, title FROM book WHERE (author_id = ?)".to_string(),
                vec![Value::from(7)]
            )
        );

        assert_eq!(hobbit.delete_instance().unwrap(), 1);
        assert_eq!(
            recorder.statements().last().unwrap(),
            "DELETE FROM book WHERE (id = ?)"
        );
        let orphan = book.instance([("title", "Orphan")]).unwrap();
        assert!(orphan.is_new());
        assert!(orphan.delete_instance().is_err());
    }

    #[test]
    fn dangling_foreign_key() {
        let (database, recorder, author, book) = setup();
        let review = Model::builder("Review")
            .database(database.clone())
            .field("id", FieldDef::integer().primary().unwrap())
            .field(
                "author_id",
                FieldDef::foreign_key(&author).nullable().unwrap(),
            )
            .register()
            .unwrap();

        recorder.push_rows(&["id", "author_id"], vec![vec![1.into(), 999.into()]]);
        let mut orphan = review.select().one().unwrap();
        assert!(orphan.fetch_related("author").unwrap().is_none());
        assert_eq!(
            recorder.executed().last().unwrap(),
            &(
                "SELECT id, name FROM author WHERE (id = ?)".to_string(),
                vec![Value::from(999)]
            )
        );
        assert!(orphan.related("author").is_none());

        recorder.push_rows(
            &["id", "author_id", "title"],
            vec![vec![1.into(), 999.into(), "Lost".into()]],
        );
        let mut lost = book.select().one().unwrap();
        let error = lost.fetch_related("author").unwrap_err();
        assert!(KeelError::is_no_data(&error));
    }

    #[test]
    fn get_or_create() {
        let (_, recorder, author, _) = setup();
        recorder.push_rows(&["id", "name"], vec![vec![7.into(), "Tolkien".into()]]);
        let (tolkien, created) = author
            .get_or_create([("name", "Tolkien")], Vec::new())
            .unwrap();
        assert!(!created);
        assert_eq!(tolkien.pk(), Some(&Value::from(7)));

        recorder.clear();
        recorder.set_last_insert_id(8);
        let (le_guin, created) = author
            .get_or_create([("name__ieq", "le guin")], [("name", "Le Guin")])
            .unwrap();
        assert!(created);
        assert_eq!(le_guin.pk(), Some(&Value::from(8)));
        assert_eq!(
            recorder.statements(),
            [
                "SELECT id, name FROM author WHERE (LOWER(name) = LOWER(?))",
                "INSERT INTO author (name) VALUES (?)",
            ]
        );
        assert_eq!(
            recorder.executed()[1].1,
            [Value::from("Le Guin")]
        );
    }

    #[test]
    fn dialect_of_the_database() {
        init_logs();
        let (backend, _) = RecordingBackend::with_writer(|| Box::new(OracleSqlWriter::new()));
        let database = Database::new(backend);
        let (author, _) = models(&database);
        let (sql, _) = author
            .select()
            .filter_by([("id", 1)])
            .unwrap()
            .limit(5)
            .sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT A.*, ROWNUM FROM (SELECT id, name FROM author WHERE (id = :a0)) A WHERE ROWNUM <= 5"
        );
    }

    #[test]
    fn unbound_model() {
        let item = Model::builder("Item")
            .field("id", FieldDef::integer().primary().unwrap())
            .register()
            .unwrap();
        assert!(item.select().execute().is_err());
        assert!(item.select().sql().is_err());
        assert!(item.close_session().is_err());
    }

    #[test]
    fn session() {
        let (database, recorder, author, book) = setup();
        database.connect().unwrap();
        {
            let mut session = Session::default();
            session.add(author.clone());
            session.add_many([book.clone()]);
            assert_eq!(session.models().len(), 2);
        }
        assert_eq!(recorder.events(), ["connect", "close", "close"]);
        assert!(!database.is_active());

        recorder.clear();
        let mut session = Session::new([author]);
        session.close().unwrap();
        assert!(session.models().is_empty());
        drop(session);
        assert_eq!(recorder.events(), ["close"]);
    }
}
