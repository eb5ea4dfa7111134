//! Cast injection.

use crate::query::placeholder::Placeholder;

/// Wrap every placeholder that needs a cast in `CAST(<token> AS <type>)`.
///
/// Replacements are planned first and then applied in order of position.
/// Each applied replacement moves every later placeholder by its length
/// delta, so `position` stays valid against the returned text.
pub fn rewrite(query: &str, placeholders: &mut [Placeholder]) -> String {
    let plan: Vec<(usize, String)> = placeholders
        .iter()
        .enumerate()
        .filter_map(|(index, placeholder)| {
            placeholder
                .cast
                .sql_type()
                .map(|ty| (index, format!("CAST({} AS {})", placeholder.token(), ty)))
        })
        .collect();

    let mut rewritten = query.to_string();
    for (index, replacement) in plan {
        let start = placeholders[index].position;
        let old_len = placeholders[index].token_len();
        rewritten.replace_range(start..start + old_len, &replacement);

        // The replacement always contains the original token.
        let delta = replacement.len() - old_len;
        for later in placeholders[index + 1..].iter_mut() {
            later.position += delta;
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::binder::bind;
    use crate::query::placeholder::{scan, CastType, ScanMode};
    use crate::types::{NamedValue, Time};
    use uuid::Uuid;

    fn token_count(query: &str) -> usize {
        scan(query, ScanMode::Literal).len()
    }

    #[test]
    fn test_no_casts_leaves_query_unchanged() {
        let query = r#"SELECT * FROM "t" WHERE "id"=?"#;
        let mut placeholders = scan(query, ScanMode::default());
        assert_eq!(rewrite(query, &mut placeholders), query);
        assert_eq!(placeholders[0].position, query.len() - 1);
    }

    #[test]
    fn test_positional_uuid_cast() {
        let query = r#"SELECT * FROM "t" WHERE "id"=? AND "n"=?"#;
        let mut placeholders = scan(query, ScanMode::default());
        let args = vec![
            NamedValue::positional(1, Uuid::nil()),
            NamedValue::positional(2, 5i64),
        ];
        bind(&mut placeholders, &args).unwrap();

        let rewritten = rewrite(query, &mut placeholders);
        assert_eq!(
            rewritten,
            r#"SELECT * FROM "t" WHERE "id"=CAST(? AS UUID) AND "n"=?"#
        );
        let first = placeholders[0].position;
        assert_eq!(&rewritten[first..first + 14], "CAST(? AS UUID");
        assert_eq!(&rewritten[placeholders[1].position..], "?");
    }

    #[test]
    fn test_named_casts_shift_later_positions() {
        let query = "VALUES (:id, :at, ?)";
        let mut placeholders = scan(query, ScanMode::default());
        let args = vec![
            NamedValue::named(1, "id", Uuid::nil()),
            NamedValue::named(2, "at", Time::default()),
            NamedValue::positional(3, "x"),
        ];
        bind(&mut placeholders, &args).unwrap();
        assert_eq!(placeholders[1].cast, CastType::Datetime);

        let rewritten = rewrite(query, &mut placeholders);
        assert_eq!(
            rewritten,
            "VALUES (CAST(:id AS UUID), CAST(:at AS DATETIME), ?)"
        );
        for placeholder in &placeholders {
            let expected = if placeholder.cast_required() {
                format!("CAST({}", placeholder.token())
            } else {
                placeholder.token()
            };
            assert!(rewritten[placeholder.position..].starts_with(&expected));
        }
        assert_eq!(token_count(&rewritten), token_count(query));
    }
}
