// cinder-vm - Error path tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error kinds, messages and locations reported by the VM.

mod common;

use common::*;

#[test]
fn test_error_kinds() {
    expect_error("undefined-thing", ErrorKind::UnresolvedSymbol);
    expect_error("((fn [x] x))", ErrorKind::ArityMismatch);
    expect_error("(+ 1 \"a\")", ErrorKind::TypeMismatch);
    expect_error("(/ 1 0)", ErrorKind::ArithmeticError);
    expect_error("(nth [1 2] 5)", ErrorKind::IndexOutOfBounds);
    expect_error("(1 2)", ErrorKind::TypeMismatch);
    expect_error("(throw :boom)", ErrorKind::UserRaised);
    expect_error("(let [x] x)", ErrorKind::InvalidSyntax);
    expect_error("(+ 9223372036854775807 1)", ErrorKind::ArithmeticError);
}

#[test]
fn test_arity_message_names_function() {
    let mut s = Session::new();
    s.eval("(defn add [x y] (+ x y))").unwrap();
    let err = s.eval("(add 1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert_eq!(err.message, "Wrong number of args (1) passed to add: expected 2");
    let err = s.eval("((fn ([a] a) ([a b c] a)) 1 2)").unwrap_err();
    assert_eq!(err.message, "Wrong number of args (2) passed to fn: expected 1 to 3");
}

#[test]
fn test_inline_operator_blames_operand() {
    //                    123456789012
    let err = expect_error("(+ 1 (/ 10 0))", ErrorKind::ArithmeticError);
    assert_eq!(err.location, loc(1, 12));
    //                    123456789
    let err = expect_error("(< 1 :k)", ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(1, 6));
}

#[test]
fn test_inline_operator_restores_attribution_table() {
    let mut s = Session::new();
    s.ctx.sources.begin_call(SourceLoc::new(9, 9));
    let err = s.eval("(+ 1 (/ 10 0))").unwrap_err();
    assert_eq!(err.location, loc(1, 12));
    let err = s.eval("(do\n  (< 1 (* 9223372036854775807 2)))").unwrap_err();
    assert_eq!(err.location, loc(2, 8));
    assert_eq!(s.ctx.sources.call_site(), SourceLoc::new(9, 9));
}

#[test]
fn test_min_integer_division_overflows() {
    let err = expect_error("(/ (- -9223372036854775807 1) -1)", ErrorKind::ArithmeticError);
    assert_eq!(err.message, "integer overflow in /");
    assert_eq!(err.location, loc(1, 1));
}

#[test]
fn test_variadic_builtin_blames_argument() {
    //                    1234567890
    let err = expect_error("(* 2 3 \"x\")", ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(1, 8));
}

#[test]
fn test_overflow_blames_call_site() {
    let err = expect_error("(do\n  (* 9223372036854775807 2))", ErrorKind::ArithmeticError);
    assert_eq!(err.location, loc(2, 3));
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
    let err = expect_error("(do 1\n   (inc missing))", ErrorKind::UnresolvedSymbol);
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
fn test_not_callable_points_at_call() {
    let err = expect_error("(let [x 1]\n  (x 2))", ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(2, 3));
}

#[test]
fn test_throw_points_at_throw_form() {
    let err = expect_error("(let [x 1]\n  (throw :nope))", ErrorKind::UserRaised);
    assert_eq!(err.location, loc(2, 3));
}

#[test]
fn test_native_callback_errors_fall_back_to_call_site() {
    let err = expect_error("(map inc [1 :a])", ErrorKind::TypeMismatch);
    assert_eq!(err.location, loc(1, 1));
}

#[test]
fn test_stack_overflow_points_at_recursive_call() {
    let mut s = Session::with_config(EvalConfig::default().with_max_call_depth(20));
    s.eval("(defn deep [n]\n  (deep n))").unwrap();
    let err = s.eval("(deep 0)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
    assert_eq!(err.location, loc(2, 3));
}

#[test]
fn test_finally_rethrows_original_error() {
    let mut s = Session::new();
    s.ctx.capture_output();
    let err = s
        .eval("(try\n  (throw :first)\n  (finally (println \"cleanup\")))")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserRaised);
    assert_eq!(err.location, loc(2, 3));
    assert_eq!(s.ctx.take_output(), "cleanup\n");
}

#[test]
fn test_heap_exhaustion_is_fatal_and_uncatchable() {
    let mut s = Session::with_config(EvalConfig::default().with_max_heap_objects(20_000));
    let err = s
        .eval("(try (loop [acc [] i 0] (recur (conj acc (str i)) (inc i))) (catch E e :caught))")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::HeapExhausted);
    assert!(s.ctx.is_terminated());
    assert_eq!(s.eval("1").unwrap_err().kind, ErrorKind::HeapExhausted);
}
