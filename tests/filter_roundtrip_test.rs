use proptest::prelude::*;
use scim_query::parser::{parse_filter, AttributePath, CompareOp, FilterNode, Literal, PathSegment};

const PATHS: &[&str] = &[
    "userName",
    "displayName",
    "name.formatted",
    "emails.value",
    "active",
    "meta.created",
    "attributes.department",
    "tags.vip",
];

const OPS: &[CompareOp] = &[
    CompareOp::Eq,
    CompareOp::Ne,
    CompareOp::Co,
    CompareOp::Sw,
    CompareOp::Ew,
    CompareOp::Gt,
    CompareOp::Ge,
    CompareOp::Lt,
    CompareOp::Le,
];

fn literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        "[a-zA-Z0-9 @._\"\\\\-]{0,12}".prop_map(Literal::String),
        any::<i64>().prop_map(|n| Literal::Number(n.into())),
        any::<u64>().prop_map(|n| Literal::Number(n.into())),
        any::<f64>().prop_filter_map("finite", |f| serde_json::Number::from_f64(f).map(Literal::Number)),
        any::<bool>().prop_map(Literal::Boolean),
    ]
}

fn comparison() -> impl Strategy<Value = FilterNode> {
    (
        prop::sample::select(PATHS),
        prop::option::of(prop::sample::select(OPS)),
        literal(),
    )
        .prop_map(|(path, op, value)| match op {
            Some(op) => FilterNode::comparison(path, op, Some(value)),
            None => FilterNode::comparison(path, CompareOp::Pr, None),
        })
}

/// `emails[<filter>].value <op> <literal>` style comparisons
fn sub_filtered(inner: impl Strategy<Value = FilterNode>) -> impl Strategy<Value = FilterNode> {
    (inner, prop::sample::select(OPS), literal()).prop_map(|(inner, op, value)| {
        FilterNode::Comparison {
            path: AttributePath {
                segments: vec![
                    PathSegment {
                        name: "emails".to_string(),
                        filter: Some(Box::new(inner)),
                    },
                    PathSegment::named("value"),
                ],
            },
            op,
            value: Some(value),
        }
    })
}

fn filter() -> impl Strategy<Value = FilterNode> {
    let leaf = prop_oneof![4 => comparison(), 1 => sub_filtered(comparison())];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| FilterNode::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| FilterNode::or(l, r)),
            inner.prop_map(FilterNode::negate),
        ]
    })
}

proptest! {
    #[test]
    fn printed_filters_parse_back_to_the_same_tree(node in filter()) {
        let text = node.to_string();
        let reparsed = parse_filter(&text);
        prop_assert_eq!(reparsed, Ok(node), "text: {}", text);
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,40}") {
        let _ = parse_filter(&input);
    }
}

#[test]
fn test_known_round_trips() {
    for text in [
        r#"userName eq "john""#,
        r#"emails[type eq "work" and value co "@example.com"]"#,
        r#"not (active eq true) or meta.created gt "2025-01-01T00:00:00Z""#,
        "(a pr or b pr) and c pr",
        r#"attributes.department sw "Sa\"les""#,
        "tags.vip eq true and attributes.salary ge -5",
    ] {
        let node = parse_filter(text).unwrap();
        assert_eq!(parse_filter(&node.to_string()).unwrap(), node, "text {}", text);
    }
}

#[test]
fn test_wide_numbers_round_trip() {
    for text in [
        "attributes.salary gt 18446744073709551615",
        "attributes.ratio lt 100000000000000000000.0",
        "attributes.ratio ge -0.000000000001",
    ] {
        let node = parse_filter(text).unwrap();
        assert_eq!(parse_filter(&node.to_string()).unwrap(), node, "text {}", text);
    }
}
