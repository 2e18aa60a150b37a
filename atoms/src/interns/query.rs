use serde::Deserialize;

use super::model::{BATCH, INTERN_NAME};
use crate::store::Query;

/// Query string parameters understood by `GET /interns`
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    pub batch: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Integer coercion with `parseInt` rules: leading whitespace, an optional
/// sign, then as many digits as there are. `None` when there are no digits.
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn integer(name: &str, value: &Option<String>) -> Option<i64> {
    let raw = given(value)?;
    let parsed = parse_int(raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring non-numeric {} parameter: {:?}", name, raw);
    }
    parsed
}

/// Translate list parameters into store queries, in a fixed order:
/// batch, search, limit, offset, sort
pub fn build_queries(params: &ListParams) -> Vec<Query> {
    let mut queries = Vec::new();

    if let Some(batch) = given(&params.batch) {
        queries.push(Query::equal(BATCH, batch));
    }
    if let Some(search) = given(&params.search) {
        queries.push(Query::search(INTERN_NAME, search));
    }
    if let Some(limit) = integer("limit", &params.limit) {
        queries.push(Query::Limit(limit));
    }
    if let Some(offset) = integer("offset", &params.offset) {
        queries.push(Query::Offset(offset));
    }
    if let (Some(sort), Some(order)) = (given(&params.sort), given(&params.order)) {
        queries.push(if order == "desc" {
            Query::OrderDesc(sort.to_string())
        } else {
            Query::OrderAsc(sort.to_string())
        });
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let slot = match *key {
                "batch" => &mut params.batch,
                "search" => &mut params.search,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                other => panic!("unknown param {other}"),
            };
            *slot = Some(value.to_string());
        }
        params
    }

    fn rendered(queries: Vec<Query>) -> Vec<String> {
        queries.iter().map(Query::to_string).collect()
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(build_queries(&ListParams::default()).is_empty());
        assert!(build_queries(&params(&[("batch", ""), ("search", "")])).is_empty());
    }

    #[test]
    fn full_parameter_set_in_fixed_order() {
        let queries = build_queries(&params(&[
            ("order", "desc"),
            ("sort", "internName"),
            ("offset", "20"),
            ("limit", "10"),
            ("search", "asha"),
            ("batch", "2025-Summer"),
        ]));
        assert_eq!(
            rendered(queries),
            vec![
                r#"equal("batch", "2025-Summer")"#,
                r#"search("internName", "asha")"#,
                "limit(10)",
                "offset(20)",
                r#"orderDesc("internName")"#,
            ]
        );
    }

    #[rstest]
    #[case("asc")]
    #[case("ASC")]
    #[case("DESC")]
    #[case("sideways")]
    fn anything_but_desc_sorts_ascending(#[case] order: &str) {
        let queries = build_queries(&params(&[("sort", "batch"), ("order", order)]));
        assert_eq!(queries, vec![Query::OrderAsc("batch".into())]);
    }

    #[test]
    fn sort_needs_an_order() {
        assert!(build_queries(&params(&[("sort", "batch")])).is_empty());
        assert!(build_queries(&params(&[("order", "desc")])).is_empty());
    }

    #[test]
    fn sort_field_is_passed_through_unchecked() {
        let queries = build_queries(&params(&[("sort", "no such field"), ("order", "asc")]));
        assert_eq!(queries, vec![Query::OrderAsc("no such field".into())]);
    }

    #[rstest]
    #[case("10", Some(10))]
    #[case("  7", Some(7))]
    #[case("10abc", Some(10))]
    #[case("3.9", Some(3))]
    #[case("-4", Some(-4))]
    #[case("+6", Some(6))]
    #[case("abc", None)]
    #[case("", None)]
    #[case("-", None)]
    fn coerces_like_parse_int(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_int(raw), expected);
    }

    #[test]
    fn unparsable_paging_is_dropped() {
        let queries = build_queries(&params(&[("limit", "lots"), ("offset", "5x")]));
        assert_eq!(queries, vec![Query::Offset(5)]);
    }
}
