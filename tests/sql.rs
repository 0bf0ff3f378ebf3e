#[cfg(test)]
mod tests {
    use indoc::indoc;
    use keel::{
        Context, FieldDef, Fragment, GenericSqlWriter, JoinType, Model, MySqlSqlWriter,
        OracleSqlWriter, Query, SqlWriter, Value, collapse_whitespace,
    };

    const GENERIC: GenericSqlWriter = GenericSqlWriter::new();
    const MYSQL: MySqlSqlWriter = MySqlSqlWriter::new();
    const ORACLE: OracleSqlWriter = OracleSqlWriter::new();

    fn models() -> (Model, Model) {
        let author = Model::builder("Author")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("name", FieldDef::varchar())
            .register()
            .unwrap();
        let book = Model::builder("Book")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("author_id", FieldDef::foreign_key(&author))
            .field("title", FieldDef::varchar())
            .register()
            .unwrap();
        (author, book)
    }

    /// Marks the columns written inside the grouping and ordering clauses.
    struct ClauseWriter;

    impl SqlWriter for ClauseWriter {
        fn write_column_ref(&self, context: &mut Context, out: &mut String, alias: &str, column: &str) {
            GENERIC.write_column_ref(context, out, alias, column);
            match context.fragment {
                Fragment::SqlSelectGroupBy => out.push_str("@group"),
                Fragment::SqlSelectOrderBy => out.push_str("@order"),
                _ => {}
            }
        }
    }

    fn render(query: &impl Query, writer: &dyn SqlWriter) -> (String, Vec<Value>) {
        query.sql_with(writer).expect("The query must render")
    }

    fn flat(sql: &str) -> String {
        collapse_whitespace(sql)
    }

    #[test]
    fn select_default() {
        let (author, book) = models();
        let (sql, parameters) = render(&book.select(), &GENERIC);
        assert_eq!(sql, "SELECT id, author_id, title FROM book");
        assert!(parameters.is_empty());
        let (sql, _) = render(&author.select_fields(["name"]), &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author");
        let (sql, _) = render(&author.select().sort(["-name", "id", "unknown"]), &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author ORDER BY name DESC, id ASC");
        let (sql, _) = render(
            &author.select().sort(["name"]).distinct(true),
            &GENERIC,
        );
        assert_eq!(sql, "SELECT DISTINCT id, name FROM author");
        let (sql, _) = render(&author.select().group(["name"]), &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author GROUP BY name");
    }

    #[test]
    fn clause_fragments() {
        let (author, _) = models();
        let query = author
            .select()
            .filter_by([("name", "x")])
            .unwrap()
            .group(["name"])
            .sort(["-id"]);
        let (sql, parameters) = render(&query, &ClauseWriter);
        assert_eq!(
            sql,
            "SELECT id, name FROM author WHERE (name = ?) GROUP BY name@group ORDER BY id@order DESC"
        );
        assert_eq!(parameters, [Value::from("x")]);
    }

    #[test]
    fn select_join() {
        let (author, book) = models();
        let query = book
            .select()
            .join(&author, JoinType::Inner, None, None)
            .unwrap()
            .filter_by([("name", "Tolkien")])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(
            sql,
            flat(indoc! {"
                SELECT t1.id, t1.author_id, t1.title, t2.id, t2.name
                FROM book t1
                INNER JOIN author t2 ON t1.author_id = t2.id
                WHERE (t2.name = ?)
            "})
        );
        assert_eq!(parameters, [Value::from("Tolkien")]);
        assert!(!query.is_naive());
        assert!(query.clone().naive(true).is_naive());

        // Reverse direction, with an explicit alias
        let query = author
            .select()
            .join(&book, JoinType::Left, None, Some("b"))
            .unwrap()
            .filter_by([("title__startswith", "The")])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(
            sql,
            flat(indoc! {"
                SELECT t1.id, t1.name, b.id, b.author_id, b.title
                FROM author t1
                LEFT OUTER JOIN book b ON t1.id = b.author_id
                WHERE (b.title LIKE ?)
            "})
        );
        assert_eq!(parameters, [Value::from("The%")]);
    }

    #[test]
    fn where_clause() {
        let (author, _) = models();
        let id = author.field("id").unwrap().clone();
        let name = author.field("name").unwrap().clone();

        let query = author
            .select()
            .filter_by([("id__gt", 1)])
            .unwrap()
            .filter_by([("name", "x")])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author WHERE (id > ? AND name = ?)");
        assert_eq!(parameters, [Value::from(1), Value::from("x")]);

        let (sql, parameters) = render(&author.select().filter(!id.lt(3)), &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author WHERE (NOT (id < ?))");
        assert_eq!(parameters, [Value::from(3)]);

        let (sql, _) = render(
            &author.select().filter(!id.lt(3).and(name.equals("x"))),
            &GENERIC,
        );
        assert_eq!(
            sql,
            "SELECT id, name FROM author WHERE (NOT (id < ? AND name = ?))"
        );

        let (sql, _) = render(
            &author
                .select()
                .filter(name.equals("a").or(name.equals("b"))),
            &GENERIC,
        );
        assert_eq!(
            sql,
            "SELECT id, name FROM author WHERE ((name = ? OR name = ?))"
        );

        let (sql, parameters) = render(
            &author.select().filter_by([("name__isnull", true)]).unwrap(),
            &GENERIC,
        );
        assert_eq!(sql, "SELECT id, name FROM author WHERE (name IS NULL)");
        assert!(parameters.is_empty());

        let (sql, parameters) = render(
            &author.select().filter_by([("id__between", [1, 5])]).unwrap(),
            &GENERIC,
        );
        assert_eq!(sql, "SELECT id, name FROM author WHERE (id BETWEEN ? AND ?)");
        assert_eq!(parameters, [Value::from(1), Value::from(5)]);

        let (sql, parameters) = render(
            &author.select().filter_by([("name__icontains", "Sm")]).unwrap(),
            &GENERIC,
        );
        assert_eq!(
            sql,
            "SELECT id, name FROM author WHERE (LOWER(name) LIKE LOWER(?))"
        );
        assert_eq!(parameters, [Value::from("%Sm%")]);
    }

    #[test]
    fn contains_cast_once() {
        let (author, _) = models();
        let query = author.select().filter_by([("name__contains", "Sm")]).unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author WHERE (name LIKE ?)");
        assert_eq!(parameters, [Value::from("%Sm%")]);
        // Rendering twice does not wrap the value again
        let (_, parameters) = render(&query, &GENERIC);
        assert_eq!(parameters, [Value::from("%Sm%")]);
    }

    #[test]
    fn subquery() {
        let (author, book) = models();
        let author_id = book.field("author_id").unwrap().clone();
        let query = book
            .select()
            .filter_by([("title", "x")])
            .unwrap()
            .filter(author_id.in_(author.select().filter_by([("name__startswith", "J")]).unwrap()));
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(
            sql,
            flat(indoc! {"
                SELECT id, author_id, title FROM book
                WHERE (title = ? AND author_id IN (SELECT id FROM author WHERE (name LIKE ?)))
            "})
        );
        assert_eq!(parameters, [Value::from("x"), Value::from("J%")]);
        let (sql, _) = render(&query, &ORACLE);
        assert_eq!(
            sql,
            flat(indoc! {"
                SELECT id, author_id, title FROM book
                WHERE (title = :a0 AND author_id IN (SELECT id FROM author WHERE (name LIKE :a1)))
            "})
        );
    }

    #[test]
    fn pagination() {
        let (author, _) = models();
        let limit = author.select().limit(10);
        let offset = author.select().offset(5);
        let page = author.select().page(5, 10);
        for (writer, expected) in [
            (
                &GENERIC as &dyn SqlWriter,
                [
                    "SELECT id, name FROM author LIMIT 10",
                    "SELECT id, name FROM author OFFSET 5",
                    "SELECT id, name FROM author LIMIT 10 OFFSET 5",
                ],
            ),
            (
                &MYSQL as &dyn SqlWriter,
                [
                    "SELECT id, name FROM author LIMIT 10",
                    "SELECT id, name FROM author LIMIT 5, 18446744073709551615",
                    "SELECT id, name FROM author LIMIT 5, 10",
                ],
            ),
            (
                &ORACLE as &dyn SqlWriter,
                [
                    "SELECT A.*, ROWNUM FROM (SELECT id, name FROM author) A WHERE ROWNUM <= 10",
                    "SELECT A.*, ROWNUM FROM (SELECT id, name FROM author) A WHERE ROWNUM >= 5",
                    "SELECT * FROM (SELECT A.*, ROWNUM r_num FROM (SELECT id, name FROM author) A WHERE ROWNUM <= 10) WHERE r_num >= 5",
                ],
            ),
        ] {
            assert_eq!(render(&limit, writer).0, expected[0]);
            assert_eq!(render(&offset, writer).0, expected[1]);
            assert_eq!(render(&page, writer).0, expected[2]);
        }
        // Zero means unset
        let (sql, _) = render(&author.select().limit(0).offset(0), &GENERIC);
        assert_eq!(sql, "SELECT id, name FROM author");
    }

    #[test]
    fn count() {
        let (author, _) = models();
        let query = author.select().sort(["name"]).filter_by([("id__lt", 10)]).unwrap();
        let (sql, parameters) = query.count_sql_with(&GENERIC).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT id, name FROM author WHERE (id < ?)) AS t0"
        );
        assert_eq!(parameters, [Value::from(10)]);
        let (sql, _) = query.count_sql_with(&ORACLE).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(1) FROM (SELECT id, name FROM author WHERE (id < :a0))"
        );
    }

    #[test]
    fn insert() {
        let (author, _) = models();
        let query = author
            .insert([("name", Value::from("Tolkien")), ("id", Value::from(1))])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(sql, "INSERT INTO author (id, name) VALUES (?, ?)");
        assert_eq!(parameters, [Value::from(1), Value::from("Tolkien")]);
        let (sql, _) = render(&query, &MYSQL);
        assert_eq!(sql, "INSERT INTO author (id, name) VALUES (%s, %s)");
        let (sql, _) = render(&query, &ORACLE);
        assert_eq!(
            sql,
            "INSERT INTO author (id, name) VALUES (:a0, :a1) RETURNING id INTO :insert_id"
        );

        // Unknown fields are skipped, the missing primary key is left to the backend
        let (sql, _) = render(
            &author.insert([("name", "Le Guin"), ("nickname", "Ursula")]).unwrap(),
            &GENERIC,
        );
        assert_eq!(sql, "INSERT INTO author (name) VALUES (?)");

        let bulk = author
            .insert_many(
                ["name"],
                vec![vec![Value::from("a")], vec![Value::from("b")]],
            )
            .unwrap();
        assert!(bulk.is_bulk());
        let (sql, parameters) = render(&bulk, &ORACLE);
        assert_eq!(sql, "INSERT INTO author (name) VALUES (:a0)");
        assert_eq!(parameters, [Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn update_delete() {
        let (author, _) = models();
        let query = author
            .update([("name", "Le Guin"), ("unknown", "value")])
            .filter_by([("id", 3)])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(sql, "UPDATE author SET name = ? WHERE (id = ?)");
        assert_eq!(parameters, [Value::from("Le Guin"), Value::from(3)]);
        let (sql, _) = render(&query, &ORACLE);
        assert_eq!(sql, "UPDATE author SET name = :a0 WHERE (id = :a1)");

        let query = author
            .delete()
            .filter_by([("name__in", ["a", "b"])])
            .unwrap();
        let (sql, parameters) = render(&query, &GENERIC);
        assert_eq!(sql, "DELETE FROM author WHERE (name IN (?, ?))");
        assert_eq!(parameters, [Value::from("a"), Value::from("b")]);
        let (sql, parameters) = render(&author.delete(), &MYSQL);
        assert_eq!(sql, "DELETE FROM author");
        assert!(parameters.is_empty());
    }

    #[test]
    fn oracle_case_insensitive() {
        let (author, _) = models();
        for (key, value, expected) in [
            ("name__ieq", "j.r.r", "^j\\.r\\.r$"),
            ("name__icontains", "tol*", "tol.*"),
            ("name__istartswith", "tol", "^tol"),
        ] {
            let (sql, parameters) = render(
                &author.select().filter_by([(key, value)]).unwrap(),
                &ORACLE,
            );
            assert_eq!(
                sql,
                "SELECT id, name FROM author WHERE (REGEXP_LIKE(name, :a0, 'i'))"
            );
            assert_eq!(parameters, [Value::from(expected)]);
        }
    }

    #[test]
    fn column_alias() {
        let tag = Model::builder("Tag")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("name", FieldDef::varchar().column("tag_name").alias("label"))
            .register()
            .unwrap();
        let (sql, _) = render(&tag.select(), &GENERIC);
        assert_eq!(sql, "SELECT id, tag_name AS label FROM tag");
    }

    #[test]
    fn idempotent_rendering() {
        let (author, book) = models();
        let query = book
            .select()
            .join(&author, JoinType::Inner, None, None)
            .unwrap()
            .filter_by([("title__contains", "Ring")])
            .unwrap()
            .page(1, 2);
        let first = render(&query, &GENERIC);
        let second = render(&query.clone(), &GENERIC);
        assert_eq!(first, second);
        assert_eq!(render(&query, &GENERIC), first);
    }
}
