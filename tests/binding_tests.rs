//! Binding, rewriting and projection through the public API.
//!
//! These tests need no server.

use rmpv::Value as MpValue;
use tntsql::error::{BindingError, ConversionError, QueryError};
use tntsql::query::{
    bind, marshal, rewrite, scan, CastType, DatetimeMode, Rows, ScanMode, WireValue,
};
use tntsql::transport::ColumnMetadata;
use tntsql::types::{CellValue, NamedValue, Time, Value, DATETIME_EXT_TYPE};
use uuid::Uuid;

/// Every ordering of `1..=n` for small `n`.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn go(prefix: &mut Vec<usize>, rest: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..rest.len() {
            let item = rest.remove(i);
            prefix.push(item);
            go(prefix, rest, out);
            prefix.pop();
            rest.insert(i, item);
        }
    }
    let mut out = Vec::new();
    go(&mut Vec::new(), &mut (1..=n).collect(), &mut out);
    out
}

#[test]
fn test_any_ordinal_order_binds() {
    let query = r#"SELECT * FROM "t" WHERE "id"=:id AND "name"=? AND "age"=:age AND "x"=?"#;

    for order in permutations(4) {
        let args: Vec<NamedValue> = order
            .iter()
            .map(|&ordinal| match ordinal {
                1 => NamedValue::named(1, "id", 10i64),
                2 => NamedValue::positional(2, "bob"),
                3 => NamedValue::named(3, "age", 30i64),
                _ => NamedValue::positional(4, Uuid::nil()),
            })
            .collect();

        let mut placeholders = scan(query, ScanMode::default());
        bind(&mut placeholders, &args).unwrap_or_else(|e| panic!("{order:?}: {e}"));

        // The second positional placeholder receives the UUID.
        let casts: Vec<CastType> = placeholders.iter().map(|p| p.cast).collect();
        assert_eq!(
            casts,
            vec![CastType::None, CastType::None, CastType::None, CastType::Uuid]
        );

        let wire = marshal(&args).unwrap();
        assert!(matches!(&wire[0], WireValue::Named { key, .. } if key == "id"));
        assert_eq!(wire[1], WireValue::Positional(MpValue::from("bob")));
    }
}

#[test]
fn test_count_mismatch_in_both_directions() {
    for (placeholders, args) in [(2usize, 1usize), (1, 2), (0, 1), (3, 0)] {
        let query = vec!["?"; placeholders].join(", ");
        let values: Vec<NamedValue> = (1..=args)
            .map(|i| NamedValue::positional(i, i as i64))
            .collect();

        let mut found = scan(&query, ScanMode::default());
        assert_eq!(
            bind(&mut found, &values).unwrap_err(),
            BindingError::CountMismatch {
                want: placeholders,
                have: args
            }
        );
    }
}

#[test]
fn test_rewrite_keeps_placeholder_count() {
    let query = "INSERT INTO \"t\" VALUES (?, :a, ?, :b, ?)";
    let args = vec![
        NamedValue::positional(1, Uuid::nil()),
        NamedValue::named(2, "a", Time::parse("2024-01-01T00:00:00Z").unwrap()),
        NamedValue::positional(3, 1.5f64),
        NamedValue::named(4, "b", "text"),
        NamedValue::positional(5, Value::null_of(tntsql::types::ValueKind::Uuid)),
    ];

    let mut placeholders = scan(query, ScanMode::default());
    bind(&mut placeholders, &args).unwrap();
    let rewritten = rewrite(query, &mut placeholders);

    assert_eq!(
        rewritten,
        "INSERT INTO \"t\" VALUES (CAST(? AS UUID), CAST(:a AS DATETIME), ?, :b, CAST(? AS UUID))"
    );
    assert_eq!(scan(&rewritten, ScanMode::default()).len(), 5);
    for placeholder in &placeholders {
        let at = &rewritten[placeholder.position..];
        if placeholder.cast_required() {
            assert!(at.starts_with("CAST("), "{at}");
        } else {
            assert!(at.starts_with(&placeholder.token()), "{at}");
        }
    }
}

#[test]
fn test_unsupported_kinds_are_rejected() {
    let rejected = [
        Value::Array(vec![Value::Uuid(Uuid::nil())]),
        Value::Array(vec![Value::Array(vec![Value::Int(1)])]),
        Value::Nullable(
            tntsql::types::ValueKind::Uuid,
            Some(Box::new(Value::String("x".to_string()))),
        ),
    ];

    for value in rejected {
        let err = tntsql::types::check_value(&value).unwrap_err();
        assert!(matches!(err, BindingError::UnsupportedValueType { .. }), "{value:?}");
    }
}

#[test]
fn test_marshaled_time_scans_back_through_text_path() {
    let original = Time::parse("2024-02-29T23:59:58.987654321+03:00").unwrap();

    let wire = marshal(&[NamedValue::positional(1, original)]).unwrap();
    let text = wire.into_iter().next().unwrap().into_msgpack();
    assert!(text.is_str());

    let mut rows = Rows::new(vec![ColumnMetadata::new("ts", Some("string"))], vec![vec![text]]);
    let row = rows.next_row().unwrap().unwrap();
    let scanned: Time = row[0].get().unwrap();

    assert_eq!(scanned, original);
}

#[test]
fn test_datetime_text_mode_round_trip() {
    let original = Time::parse("1999-12-31T23:59:59.5Z").unwrap();
    let ext = MpValue::Ext(DATETIME_EXT_TYPE, original.datetime().to_ext_bytes());

    let mut rows = Rows::new(
        vec![ColumnMetadata::new("ts", Some("datetime"))],
        vec![vec![ext.clone()], vec![ext]],
    )
    .with_datetime_mode(DatetimeMode::Text);

    let mut dest = vec![CellValue::Null];
    assert!(rows.next(&mut dest).unwrap());
    assert!(matches!(dest[0], CellValue::String(_)));
    assert_eq!(dest[0].get::<Time>().unwrap(), original);

    rows.close();
    assert!(matches!(rows.next(&mut dest), Err(QueryError::RowsClosed)));
}

#[test]
fn test_unhandled_result_kind() {
    let mut rows = Rows::new(
        vec![ColumnMetadata::new("a", None), ColumnMetadata::new("b", None)],
        vec![vec![MpValue::from(1), MpValue::Binary(vec![1, 2])]],
    );

    let mut dest = vec![CellValue::Null; 2];
    let err = rows.next(&mut dest).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Conversion(ConversionError::UnhandledKind { column: 1, ref kind }) if kind == "binary"
    ));
}
