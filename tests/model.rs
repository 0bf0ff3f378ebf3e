#[cfg(test)]
mod tests {
    use keel::{FieldDef, FieldKind, JoinType, KeelError, Model, Value};
    use std::str::FromStr;

    fn is_validation(error: &keel::Error) -> bool {
        matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::Validation(..))
        )
    }

    #[test]
    fn registration() {
        let person = Model::builder("Person")
            .ordering(["-age"])
            .field("id", FieldDef::integer().primary().unwrap())
            .field("full_name", FieldDef::char().column("NAME").max_length(40))
            .field("age", FieldDef::integer().default(18))
            .register()
            .unwrap();
        assert_eq!(person.table(), "person");
        assert_eq!(person.pk().name(), "id");
        assert!(!person.is_auto_increment());
        assert_eq!(
            person.field_names().collect::<Vec<_>>(),
            ["id", "full_name", "age"]
        );
        let full_name = person.field("full_name").unwrap();
        assert_eq!(full_name.column(), "name");
        assert_eq!(full_name.kind(), FieldKind::Char(40));
        assert_eq!(person.field("NAME").unwrap().name(), "full_name");
        assert_eq!(person.columns().get("name").unwrap(), "full_name");
        assert_eq!(person.defaults().get("age"), Some(&Value::from(18)));
        assert_eq!(person.ordering().len(), 1);
        assert!(person.field("missing").is_none());
        assert!(is_validation(&person.field_or_err("missing").unwrap_err()));
        assert!(is_validation(&person.database().unwrap_err()));

        // Inheritance of the options
        let employee = Model::builder("Employee")
            .extends(&person)
            .table("staff")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("age", FieldDef::integer())
            .register()
            .unwrap();
        assert_eq!(employee.table(), "staff");
        assert_eq!(employee.ordering().len(), 1);
        assert_eq!(employee.ordering()[0].field.model(), "Employee");
    }

    #[test]
    fn registration_errors() {
        assert!(is_validation(
            &Model::builder("Empty")
                .field("name", FieldDef::varchar())
                .register()
                .unwrap_err()
        ));
        assert!(is_validation(
            &Model::builder("Twice")
                .field("a", FieldDef::integer().primary().unwrap())
                .field("b", FieldDef::integer().primary().unwrap())
                .register()
                .unwrap_err()
        ));
        assert!(is_validation(
            &Model::builder("Duplicate")
                .field("id", FieldDef::integer().primary().unwrap())
                .field("value", FieldDef::integer())
                .field("value", FieldDef::varchar())
                .register()
                .unwrap_err()
        ));
        assert!(is_validation(
            &Model::builder("Columns")
                .field("id", FieldDef::integer().primary().unwrap())
                .field("a", FieldDef::integer().column("value"))
                .field("b", FieldDef::integer().column("VALUE"))
                .register()
                .unwrap_err()
        ));
        assert!(is_validation(
            &Model::builder("Ordering")
                .ordering(["-missing"])
                .field("id", FieldDef::integer().primary().unwrap())
                .register()
                .unwrap_err()
        ));
        assert!(FieldDef::integer().nullable().unwrap().primary().is_err());
        assert!(FieldDef::integer().primary().unwrap().nullable().is_err());
    }

    #[test]
    fn relations() {
        let country = Model::builder("Country")
            .field("code", FieldDef::char().max_length(2).primary().unwrap())
            .field("name", FieldDef::varchar())
            .register()
            .unwrap();
        let city = Model::builder("City")
            .field("id", FieldDef::integer().primary().unwrap())
            .field(
                "country_code",
                FieldDef::foreign_key(&country)
                    .related_name("nation")
                    .reverse_name("cities"),
            )
            .register()
            .unwrap();
        let street = Model::builder("Street")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("city_id", FieldDef::foreign_key(&city))
            .register()
            .unwrap();

        assert_eq!(city.relations().get("country_code"), Some(&country));
        assert_eq!(
            country.reverse_relations().keys().collect::<Vec<_>>(),
            ["cities"]
        );
        assert_eq!(city.reverse_relations().get("street_set"), Some(&street));
        let fk = city.field("country_code").unwrap().foreign_key().unwrap();
        assert_eq!(fk.related_name, "nation");
        assert_eq!(fk.field.name(), "code");
        assert_eq!(city.field("country_code").unwrap().kind(), FieldKind::Char(2));
        assert_eq!(
            street.field("city_id").unwrap().foreign_key().unwrap().related_name,
            "city"
        );
        assert!(city.relation_exists(&country));
        assert!(country.relation_exists(&city));
        assert!(!street.relation_exists(&country));
        assert!(FieldDef::foreign_key_to(&country, "name").is_ok());
        assert!(FieldDef::foreign_key_to(&country, "missing").is_err());

        // Joins follow the relations only
        let error = street
            .select()
            .join(&country, JoinType::Inner, None, None)
            .unwrap_err();
        assert!(is_validation(&error));
        let query = street
            .select()
            .join(&city, JoinType::Inner, None, None)
            .unwrap();
        assert!(query.clone().to(&country).is_err());
        let query = query
            .to(&city)
            .unwrap()
            .join(&country, JoinType::Left, None, None)
            .unwrap();
        assert_eq!(query.active_model(), &city);
        assert_eq!(
            query.aliases().values().collect::<Vec<_>>(),
            ["t1", "t2", "t3"]
        );
        assert_eq!(query.joins().count(), 2);
        assert!(matches!(
            query.having(country.pk().equals("IT")).unwrap_err().downcast_ref::<KeelError>(),
            Some(KeelError::NotImplemented(..))
        ));
    }

    #[test]
    fn join_types() {
        assert_eq!(JoinType::from_str("join").unwrap(), JoinType::Inner);
        assert_eq!(JoinType::from_str("left outer  join").unwrap(), JoinType::Left);
        assert_eq!(JoinType::from_str("RIGHT").unwrap(), JoinType::Right);
        assert_eq!(JoinType::from_str("full outer").unwrap(), JoinType::Outer);
        assert!(JoinType::from_str("sideways").is_err());
    }

    #[test]
    fn bulk_insert_arguments() {
        let item = Model::builder("Item")
            .field("id", FieldDef::integer().primary().unwrap())
            .field("name", FieldDef::varchar())
            .register()
            .unwrap();
        assert!(is_validation(
            &item.insert_many(["name"], Vec::new()).unwrap_err()
        ));
        assert!(is_validation(
            &item
                .insert_many(Vec::<&str>::new(), vec![vec![Value::from("a")]])
                .unwrap_err()
        ));
        assert!(is_validation(
            &item
                .insert_many(["id", "name"], vec![vec![Value::from(1)]])
                .unwrap_err()
        ));
        assert!(matches!(
            item.insert_many(["color"], vec![vec![Value::from("red")]])
                .unwrap_err()
                .downcast_ref::<KeelError>(),
            Some(KeelError::Query(..))
        ));
    }
}
