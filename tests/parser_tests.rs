// Integration tests for price normalization and query parsing

use wish_sniper::normalize_price;
use wish_sniper::parser::{Parser, ParserOptions, QueryParser, Vocabulary};

fn parser() -> QueryParser {
    QueryParser::with_builtin_vocabulary().unwrap()
}

#[test]
fn test_normalize_examples() {
    assert_eq!(normalize_price("50k"), Some(50_000));
    assert_eq!(normalize_price("1.5L"), Some(150_000));
    assert_eq!(normalize_price("Rs 50,000"), Some(50_000));
    assert_eq!(normalize_price("abc"), None);
}

#[test]
fn test_laptop_under_budget() {
    let parsed = parser().parse("laptop under 60k");
    assert_eq!(parsed.category.as_deref(), Some("Laptops"));
    assert_eq!(parsed.max_price, Some(60_000));
    assert_eq!(parsed.min_price, 0);
}

#[test]
fn test_phone_range() {
    let parsed = parser().parse("phone 20k to 30k");
    assert_eq!(parsed.category.as_deref(), Some("Mobile Phones"));
    assert_eq!(parsed.min_price, 20_000);
    assert_eq!(parsed.max_price, Some(30_000));
}

#[test]
fn test_dash_range_in_lakh() {
    let parsed = parser().parse("macbook 1L-1.5L");
    assert_eq!(parsed.category.as_deref(), Some("Laptops"));
    assert_eq!(parsed.min_price, 100_000);
    assert_eq!(parsed.max_price, Some(150_000));
}

#[test]
fn test_category_without_price() {
    let parsed = parser().parse("need a tv");
    assert_eq!(parsed.category.as_deref(), Some("Televisions"));
    assert_eq!(parsed.max_price, None);
    assert_eq!(parsed.min_price, 0);
}

#[test]
fn test_specs_are_not_prices() {
    let parsed = parser().parse("iphone 16gb 5000mah");
    assert!(parsed.tags.iter().any(|t| t == "16gb"));
    assert!(parsed.tags.iter().any(|t| t == "5000mah"));
    assert_eq!(parsed.max_price, None);
    assert_eq!(parsed.min_price, 0);
}

#[test]
fn test_suffix_max_phrase() {
    let parsed = parser().parse("running shoes rs 3000 only");
    assert_eq!(parsed.max_price, Some(3_000));
    assert_eq!(parsed.category.as_deref(), Some("Fashion"));
}

#[test]
fn test_original_query_kept_verbatim() {
    let query = "  Samsung TV, 55 inch!! ";
    let parsed = parser().parse(query);
    assert_eq!(parsed.original_query, query);
}

#[test]
fn test_injected_vocabulary() {
    let vocabulary = Vocabulary::new(
        vec![
            ("drone".to_string(), "Drones".to_string()),
            ("camera".to_string(), "Cameras".to_string()),
        ],
        vec![("dji store".to_string(), "DJI".to_string())],
        vec!["with".to_string()],
    );
    let parser = QueryParser::new(vocabulary, ParserOptions::default()).unwrap();
    let parsed = parser.parse("drone with camera from dji store");
    assert_eq!(parsed.category.as_deref(), Some("Drones"));
    assert_eq!(parsed.platforms, vec!["DJI"]);
    assert_eq!(parsed.tags[0], "drone");
    assert!(parsed.tags.iter().any(|t| t == "camera"));
}

#[test]
fn test_parse_is_deterministic() {
    let p = parser();
    for q in [
        "laptop under 60k",
        "gaming laptop 16gb ram 512gb ssd above 70000 on amazon",
        "kurti 500-900 myntra ajio",
        "tv",
        "",
    ] {
        assert_eq!(p.parse(q), p.parse(q));
    }
}

#[test]
fn test_bounds_are_ordered() {
    let p = parser();
    for q in [
        "laptop under 60k",
        "phone 30k to 20k",
        "fridge above 40k below 25k",
        "watch 5000 3000 8000",
        "tablet more than 15k",
        "headset 1.5k and 900",
        "",
    ] {
        let parsed = p.parse(q);
        if let Some(max) = parsed.max_price {
            assert!(max >= parsed.min_price, "{}: {} < {}", q, max, parsed.min_price);
        }
    }
}

#[test]
fn test_tags_are_unique() {
    let parsed = parser().parse("laptop laptop 16gb 16GB fast fast");
    let mut seen = std::collections::HashSet::new();
    for tag in &parsed.tags {
        assert!(seen.insert(tag.clone()), "duplicate tag {}", tag);
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Queries assembled from words the parser reacts to, so that price,
    /// category and platform stages all get exercised.
    fn query_strategy() -> impl Strategy<Value = String> {
        let token = prop_oneof![
            prop::sample::select(vec![
                "laptop", "phone", "tv", "under", "below", "above", "from", "to", "-", "and",
                "rs", "₹", "only", "max", "budget", "on", "amazon", "flipkart", "16gb", "5000mah",
                "with", "ram",
            ])
            .prop_map(str::to_string),
            (1u32..500_000).prop_map(|n| n.to_string()),
            (1u32..200, prop::sample::select(vec!["k", "l", "K", "L", ".5k", ",000"]))
                .prop_map(|(n, suffix)| format!("{}{}", n, suffix)),
        ];
        prop::collection::vec(token, 0..8).prop_map(|words| words.join(" "))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 500,
            ..ProptestConfig::default()
        })]

        #[test]
        fn normalize_never_panics(input in "\\PC{0,40}") {
            let _ = normalize_price(&input);
        }

        #[test]
        fn parse_is_idempotent(query in query_strategy()) {
            let p = parser();
            prop_assert_eq!(p.parse(&query), p.parse(&query));
        }

        #[test]
        fn max_never_below_min(query in query_strategy()) {
            let parsed = parser().parse(&query);
            if let Some(max) = parsed.max_price {
                prop_assert!(max >= parsed.min_price, "{}: {} < {}", query, max, parsed.min_price);
            }
        }

        #[test]
        fn arbitrary_text_keeps_bounds_and_unique_tags(query in "\\PC{0,60}") {
            let parsed = parser().parse(&query);
            if let Some(max) = parsed.max_price {
                prop_assert!(max >= parsed.min_price);
            }
            let mut seen = std::collections::HashSet::new();
            for tag in &parsed.tags {
                prop_assert!(seen.insert(tag.clone()), "duplicate tag {}", tag);
            }
            prop_assert_eq!(parsed.original_query, query);
        }
    }
}
