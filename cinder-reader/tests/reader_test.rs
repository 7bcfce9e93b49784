// cinder-reader - Reader integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the reader: locations, reader macros and the
//! print/read round trip.

use cinder_reader::{Form, FormKind, Parser, SourceLoc, read_all};
use proptest::prelude::*;

fn read_one(s: &str) -> Form {
    Parser::parse_str(s)
        .unwrap_or_else(|e| panic!("failed to read '{}': {}", s, e))
        .unwrap_or_else(|| panic!("no form in '{}'", s))
}

/// Strip locations so forms can be compared structurally.
fn strip(form: &Form) -> Form {
    let kind = match &form.kind {
        FormKind::List(items) => FormKind::List(items.iter().map(strip).collect()),
        FormKind::Vector(items) => FormKind::Vector(items.iter().map(strip).collect()),
        FormKind::Map(items) => FormKind::Map(items.iter().map(strip).collect()),
        FormKind::Set(items) => FormKind::Set(items.iter().map(strip).collect()),
        other => other.clone(),
    };
    Form::synthetic(kind)
}

// =============================================================================
// Locations
// =============================================================================

#[test]
fn test_multiline_defn_locations() {
    let src = "(defn add [x y]\n  (+ x y))";
    let form = read_one(src);
    let items = form.as_list().unwrap();
    let body = &items[3];
    assert_eq!(body.loc, SourceLoc::new(2, 3));
    assert_eq!(body.children()[0].loc, SourceLoc::new(2, 4));
    assert_eq!(body.children()[1].loc, SourceLoc::new(2, 6));
    assert_eq!(body.children()[2].loc, SourceLoc::new(2, 8));
}

#[test]
fn test_locations_after_comments_and_commas() {
    let forms = read_all("; header\n1, 2 ;; trailing\n  :k").unwrap();
    let locs: Vec<SourceLoc> = forms.iter().map(|f| f.loc).collect();
    assert_eq!(
        locs,
        vec![
            SourceLoc::new(2, 1),
            SourceLoc::new(2, 4),
            SourceLoc::new(3, 3)
        ]
    );
}

#[test]
fn test_syntax_quote_and_unquote_desugar() {
    let form = read_one("`(a ~b ~@c)");
    assert_eq!(
        form.to_string(),
        "(syntax-quote (a (unquote b) (unquote-splicing c)))"
    );
    assert_eq!(form.loc, SourceLoc::new(1, 1));
}

#[test]
fn test_deref_desugars() {
    assert_eq!(read_one("@counter").to_string(), "(deref counter)");
}

#[test]
fn test_set_literal() {
    let form = read_one("#{1 2}");
    assert!(matches!(form.kind, FormKind::Set(ref items) if items.len() == 2));
}

#[test]
fn test_unterminated_string_is_error() {
    let err = Parser::parse_str("\"abc").unwrap_err();
    assert_eq!(err.loc.line, 1);
}

// =============================================================================
// Round trip
// =============================================================================

fn arb_leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z][a-z0-9-]{0,6}".prop_map(|s| s),
        "[a-z]{1,5}".prop_map(|s| format!(":{}", s)),
        "[a-z ]{0,6}".prop_map(|s| format!("\"{}\"", s)),
        Just("nil".to_string()),
        Just("true".to_string()),
    ]
}

fn arb_source() -> impl Strategy<Value = String> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|v| format!("({})", v.join(" "))),
            prop::collection::vec(inner, 0..4).prop_map(|v| format!("[{}]", v.join(" "))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Printing a form and reading it back yields the same structure.
    #[test]
    fn prop_print_read_round_trip(src in arb_source()) {
        let form = read_one(&src);
        let printed = form.to_string();
        let reread = read_one(&printed);
        prop_assert_eq!(strip(&form), strip(&reread));
    }

    /// Every node the reader produces has a known location.
    #[test]
    fn prop_every_node_located(src in arb_source()) {
        fn check(form: &Form) -> bool {
            form.loc.is_known() && form.children().iter().all(check)
        }
        prop_assert!(check(&read_one(&src)));
    }
}
