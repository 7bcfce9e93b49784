// cinder-core - Error location tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Errors point at the most specific source form available.

mod common;

use common::*;

fn loc(line: u32, column: u32) -> Option<SourceLoc> {
    Some(SourceLoc::new(line, column))
}

#[test]
fn test_blames_offending_argument() {
    //          123456789012
    let err = eval_err("(+ 1 (/ 10 0))");
    assert_eq!(err.kind, ErrorKind::ArithmeticError);
    assert_eq!(err.location, loc(1, 12));
}

#[test]
fn test_blames_non_numeric_argument() {
    //          1234567890
    let err = eval_err("(* 2 3 \"x\")");
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(1, 8));
}

#[test]
fn test_location_survives_macro_expansion() {
    let mut s = Session::new();
    s.eval("(defn add [x y]\n  (+ x y))").unwrap();
    let err = s.eval("\n\n(add 1 \"hello\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(2, 3));
}

#[test]
fn test_unresolved_symbol_location() {
    let err = eval_err("(do 1\n   (inc missing))");
    assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);
    assert_eq!(err.location, loc(2, 9));
}

#[test]
fn test_arity_error_points_at_call() {
    let mut s = Session::new();
    s.eval("(defn one [x] x)").unwrap();
    let err = s.eval("(inc\n (one 1 2))").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert_eq!(err.location, loc(2, 2));
}

#[test]
fn test_throw_points_at_throw_form() {
    let err = eval_err("(let [x 1]\n  (throw :nope))");
    assert_eq!(err.kind, ErrorKind::UserRaised);
    assert_eq!(err.location, loc(2, 3));
}

#[test]
fn test_native_callback_errors_fall_back_to_call_site() {
    // `inc` is called by `map`, not by a call form.
    let err = eval_err("(map inc [1 :a])");
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(1, 1));
}

#[test]
fn test_errors_without_a_call_chain_get_top_level_location() {
    let err = eval_err("\n  undefined");
    assert_eq!(err.location, loc(2, 3));
}
