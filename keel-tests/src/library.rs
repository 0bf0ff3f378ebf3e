use keel::{Database, FieldDef, JoinType, KeelError, Model, Query, Value};
use std::sync::{Arc, Mutex};

static MUTEX: Mutex<()> = Mutex::new(());

fn models(database: &Arc<Database>) -> (Model, Model) {
    let author = Model::builder("Author")
        .table("library_author")
        .database(database.clone())
        .auto_increment(true)
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("name", FieldDef::varchar().max_length(100))
        .field("country", FieldDef::varchar().max_length(50))
        .register()
        .expect("Failed to register Author");
    let book = Model::builder("Book")
        .table("library_book")
        .database(database.clone())
        .auto_increment(true)
        .ordering(["title"])
        .field("id", FieldDef::integer().primary().expect("Valid primary key"))
        .field("author_id", FieldDef::foreign_key(&author))
        .field("title", FieldDef::varchar())
        .field("year", FieldDef::integer().nullable().expect("Valid nullable field"))
        .register()
        .expect("Failed to register Book");
    (author, book)
}

fn run(model: &Model, statement: &str) {
    model
        .raw(statement, Vec::new())
        .execute()
        .expect(format!("Failed to execute `{}`", statement).as_str());
}

pub fn library(database: &Arc<Database>) {
    let _lock = MUTEX.lock().expect("Library lock is poisoned");
    let (author, book) = models(database);

    // Setup
    run(&book, "DROP TABLE IF EXISTS library_book");
    run(&author, "DROP TABLE IF EXISTS library_author");
    run(
        &author,
        "CREATE TABLE library_author (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL, country VARCHAR(50) NOT NULL)",
    );
    run(
        &book,
        "CREATE TABLE library_book (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL REFERENCES library_author(id), title VARCHAR(3000) NOT NULL, year INTEGER)",
    );

    // Create
    let tolkien = author
        .create([("name", "J.R.R. Tolkien"), ("country", "UK")])
        .expect("Failed to create Tolkien");
    assert!(!tolkien.is_new());
    let tolkien_id = tolkien
        .get_as::<i64>("id")
        .expect("The generated id must be assigned");
    let glukhovsky = author
        .create([("name", "Dmitry Glukhovsky"), ("country", "Russia")])
        .expect("Failed to create Glukhovsky");
    let glukhovsky_id = glukhovsky
        .get_as::<i64>("id")
        .expect("The generated id must be assigned");
    assert_ne!(tolkien_id, glukhovsky_id);

    book.insert_many(
        ["author_id", "title", "year"],
        vec![
            vec![tolkien_id.into(), "The Hobbit".into(), 1937.into()],
            vec![tolkien_id.into(), "The Silmarillion".into(), 1977.into()],
            vec![glukhovsky_id.into(), "Metro 2033".into(), 2002.into()],
        ],
    )
    .expect("Valid bulk insert")
    .execute()
    .expect("Failed to insert the books");
    assert_eq!(book.select().count().expect("Failed to count the books"), 3);
    assert!(
        book.select()
            .filter_by([("year__gt", 2000)])
            .expect("Valid filter")
            .exists()
            .expect("Failed to check the existence")
    );

    // Graph materialization
    let books = book
        .select()
        .join(&author, JoinType::Inner, None, None)
        .expect("Book must be joinable with Author")
        .filter_by([("name", "J.R.R. Tolkien")])
        .expect("Valid filter")
        .execute()
        .expect("Failed to query the books")
        .collect_all()
        .expect("Failed to read the books");
    assert_eq!(books.len(), 2);
    assert_eq!(
        books
            .iter()
            .map(|v| v.get_as::<String>("title").expect("Title"))
            .collect::<Vec<_>>(),
        ["The Hobbit", "The Silmarillion"]
    );
    for instance in &books {
        let related = instance
            .related("author")
            .expect("The author must be attached");
        assert_eq!(related, &tolkien);
        assert_eq!(
            related.get_as::<String>("name").expect("Name"),
            "J.R.R. Tolkien"
        );
        assert_eq!(
            instance.get_as::<i64>("author_id").expect("Author id"),
            tolkien_id
        );
    }

    // Pattern filters
    assert_eq!(
        book.select()
            .filter_by([("title__contains", "Silm")])
            .expect("Valid filter")
            .count()
            .expect("Failed to count"),
        1
    );
    assert_eq!(
        book.select()
            .filter_by([("title__icontains", "HOBBIT")])
            .expect("Valid filter")
            .count()
            .expect("Failed to count"),
        1
    );

    // Single object
    let metro = book
        .get([("title", "Metro 2033")])
        .expect("Metro 2033 must exist");
    assert_eq!(metro.get_as::<i64>("year").expect("Year"), 2002);
    let error = book
        .get([("title", "Missing")])
        .expect_err("No book has that title");
    assert!(KeelError::is_no_data(&error));
    let latest = book
        .select()
        .sort_force(["-year"])
        .first()
        .expect("There must be a latest book");
    assert_eq!(latest, metro);

    let (existing, created) = author
        .get_or_create(
            [("name", Value::from("J.R.R. Tolkien"))],
            [("country", Value::from("South Africa"))],
        )
        .expect("Failed to get Tolkien");
    assert!(!created);
    assert_eq!(existing, tolkien);
    assert_eq!(existing.get_as::<String>("country").expect("Country"), "UK");
    let (le_guin, created) = author
        .get_or_create(
            [("name", Value::from("Ursula K. Le Guin"))],
            [("country", Value::from("USA"))],
        )
        .expect("Failed to create Le Guin");
    assert!(created);
    assert_eq!(le_guin.get_as::<String>("country").expect("Country"), "USA");
    assert_eq!(author.select().count().expect("Failed to count"), 3);

    // Dirty tracking
    let mut hobbit = book
        .get([("title", "The Hobbit")])
        .expect("The Hobbit must exist");
    hobbit.set("year", 1938).expect("Valid year");
    hobbit.set("title", "The Hobbit").expect("Valid title");
    assert_eq!(hobbit.dirty_fields().collect::<Vec<_>>(), ["year"]);
    hobbit.save().expect("Failed to save The Hobbit");
    assert_eq!(hobbit.dirty_fields().count(), 0);
    assert_eq!(
        book.get([("title", "The Hobbit")])
            .expect("The Hobbit must exist")
            .get_as::<i64>("year")
            .expect("Year"),
        1938
    );
    assert_eq!(
        book.update([("year", 1937)])
            .filter_by([("title", "The Hobbit")])
            .expect("Valid filter")
            .execute()
            .expect("Failed to update The Hobbit"),
        1
    );
    hobbit.refresh(&["year"]).expect("Failed to refresh");
    assert_eq!(hobbit.get_as::<i64>("year").expect("Year"), 1937);

    // Relations
    let mut metro = metro;
    assert!(metro.related("author").is_none());
    let related = metro
        .fetch_related("author")
        .expect("Failed to fetch the author")
        .expect("Metro 2033 has an author");
    assert_eq!(related, &glukhovsky);
    assert_eq!(
        tolkien
            .reverse("book_set")
            .expect("Author must have the book_set accessor")
            .count()
            .expect("Failed to count"),
        2
    );
    assert!(tolkien.reverse("chapters").is_err());

    // Delete
    assert_eq!(metro.delete_instance().expect("Failed to delete"), 1);
    assert_eq!(book.select().count().expect("Failed to count"), 2);
    assert_eq!(
        book.delete()
            .filter_by([("author_id", tolkien_id)])
            .expect("Valid filter")
            .execute()
            .expect("Failed to delete the books"),
        2
    );
    assert!(!book.select().exists().expect("Failed to check the existence"));
}
