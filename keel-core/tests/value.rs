#[cfg(test)]
mod tests {
    use keel_core::{AsValue, FieldKind, Value};
    use time::{Date, Month, PrimitiveDateTime, Time};

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Null, Value::Int64(None));
        assert_eq!(Value::Varchar(None), Value::Date(None));
        assert_ne!(Value::Int64(Some(0)), Value::Null);
        assert!(Value::Boolean(None).is_null());
        assert!(matches!(Value::Varchar(Some("a".into())).as_null(), Value::Varchar(None)));
        assert!(Value::Int64(Some(1)).same_type(&Value::Int64(None)));
        assert!(!Value::Int64(Some(1)).same_type(&Value::Float64(Some(1.0))));
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        assert_eq!(bool::try_from_value(val).unwrap(), true);
        assert_eq!(bool::try_from_value(0.into()).unwrap(), false);
        assert_eq!(bool::try_from_value(7.into()).unwrap(), true);
        assert_eq!(bool::try_from_value("False".into()).unwrap(), false);
        assert!(matches!(bool::try_from_value("maybe".into()), Err(..)));
        assert!(matches!(bool::try_from_value(0.5.into()), Err(..)));
    }

    #[test]
    fn value_integer() {
        let val: Value = (-12 as i8).into();
        assert_eq!(val, Value::Int64(Some(-12)));
        assert_eq!(i32::try_from_value(val).unwrap(), -12);
        assert_eq!(i64::try_from_value(" 42 ".into()).unwrap(), 42);
        assert_eq!(i64::try_from_value(3.0.into()).unwrap(), 3);
        assert_eq!(u8::try_from_value(true.into()).unwrap(), 1);
        assert!(matches!(i64::try_from_value(3.5.into()), Err(..)));
        assert!(matches!(i64::try_from_value("42a".into()), Err(..)));
        assert!(matches!(u8::try_from_value(300.into()), Err(..)));
        assert!(matches!(u32::try_from_value((-1).into()), Err(..)));
        assert_eq!(Value::from(u32::MAX), Value::Int64(Some(u32::MAX as i64)));
        assert!(matches!(i32::try_from_value(Value::Null), Err(..)));
        assert_eq!(Option::<i32>::try_from_value(Value::Int64(None)).unwrap(), None);
    }

    #[test]
    fn value_float() {
        let val: Value = 1.5f32.into();
        assert_eq!(val, Value::Float64(Some(1.5)));
        assert_eq!(f64::try_from_value(2.into()).unwrap(), 2.0);
        assert_eq!(f64::try_from_value("-0.25".into()).unwrap(), -0.25);
        assert!(matches!(f32::try_from_value("abc".into()), Err(..)));
    }

    #[test]
    fn value_text() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert_eq!(String::try_from_value(12.into()).unwrap(), "12");
        assert!(matches!(String::try_from_value(Value::Varchar(None)), Err(..)));
        assert_eq!(
            Option::<String>::try_from_value(Value::Null).unwrap(),
            None
        );
        assert_eq!(Value::Varchar(Some("it".into())).to_string(), "'it'");
        assert_eq!(Value::Int64(None).to_string(), "NULL");
        assert_eq!(Value::Int64(Some(-3)).to_string(), "-3");
    }

    #[test]
    fn value_temporal() {
        let date = Date::from_calendar_date(2024, Month::February, 29).unwrap();
        let time = Time::from_hms(13, 45, 10).unwrap();
        let timestamp = PrimitiveDateTime::new(date, time);
        assert_eq!(Date::try_from_value("2024-02-29".into()).unwrap(), date);
        assert_eq!(Date::try_from_value(timestamp.into()).unwrap(), date);
        assert_eq!(Time::try_from_value("13:45:10".into()).unwrap(), time);
        assert_eq!(
            Time::try_from_value("13:45".into()).unwrap(),
            Time::from_hms(13, 45, 0).unwrap()
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2024-02-29T13:45:10".into()).unwrap(),
            timestamp
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2024-02-29 13:45:10".into()).unwrap(),
            timestamp
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(date.into()).unwrap(),
            date.midnight()
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(0.into()).unwrap(),
            Date::from_calendar_date(1970, Month::January, 1)
                .unwrap()
                .midnight()
        );
        assert!(matches!(Date::try_from_value("29/02/2024".into()), Err(..)));
        assert_eq!(Value::from(date).to_string(), "'2024-02-29'");
    }

    #[test]
    fn field_kind_conversions() {
        let kind = FieldKind::Varchar(5);
        assert_eq!(kind.to_application(Value::Null).unwrap(), Value::Varchar(Some("".into())));
        assert_eq!(
            kind.to_storage("truncated".into()).unwrap(),
            Value::Varchar(Some("trunc".into()))
        );
        assert_eq!(
            kind.to_storage("àèìòùx".into()).unwrap(),
            Value::Varchar(Some("àèìòù".into()))
        );
        assert!(kind.to_storage(Value::Null).unwrap().is_null());

        let kind = FieldKind::Boolean;
        assert_eq!(kind.to_application(1.into()).unwrap(), Value::Boolean(Some(true)));
        assert_eq!(kind.to_storage(true.into()).unwrap(), Value::Int64(Some(1)));
        assert_eq!(kind.to_application(Value::Null).unwrap(), Value::Boolean(None));

        let kind = FieldKind::Integer;
        assert_eq!(kind.to_application("7".into()).unwrap(), Value::Int64(Some(7)));
        assert!(matches!(kind.to_application("seven".into()), Err(..)));

        let kind = FieldKind::Date;
        assert_eq!(
            kind.to_application("2001-09-11".into()).unwrap(),
            Value::Date(Some(
                Date::from_calendar_date(2001, Month::September, 11).unwrap()
            ))
        );
        assert_eq!(kind.empty_value(), Value::Date(None));
    }
}
