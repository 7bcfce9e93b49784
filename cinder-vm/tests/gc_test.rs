// cinder-vm - Collector tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Values held on the VM stack, in frames and in captures survive
//! collections at every safe point.

mod common;

use common::*;

fn stress_session() -> Session {
    Session::with_config(EvalConfig::default().with_stress_gc(true))
}

#[test]
fn test_operands_on_stack_survive_calls() {
    let mut s = stress_session();
    // Each pending operand is only reachable from the value stack while
    // the next argument allocates.
    assert_eq!(
        s.eval_str("(vector [1 2] (str \"a\" \"b\") (list 3 4) {:k [5]})").unwrap(),
        "[[1 2] \"ab\" (3 4) {:k [5]}]"
    );
}

#[test]
fn test_loop_accumulator_survives_backward_jumps() {
    let mut s = stress_session();
    assert_eq!(
        s.eval_str("(loop [i 0 acc []] (if (< i 50) (recur (inc i) (conj acc (str i))) (count acc)))")
            .unwrap(),
        "50"
    );
    assert!(s.ctx.heap_stats().collections > 0);
}

#[test]
fn test_captures_survive_collection() {
    let mut s = stress_session();
    s.eval("(def f (let [xs [1 [2 3]]] (fn [] xs)))").unwrap();
    s.eval("(map (fn [_] (vector :junk :junk)) (range 5))").unwrap();
    assert_eq!(s.eval_str("(f)").unwrap(), "[1 [2 3]]");
}

#[test]
fn test_compiled_constants_survive_collection() {
    let mut s = stress_session();
    s.eval("(defn greet [] \"hello\")").unwrap();
    s.eval("(defn quoted [] '(a [b]))").unwrap();
    s.eval("(map (fn [_] (str :junk)) (range 5))").unwrap();
    assert_eq!(s.eval_str("(greet)").unwrap(), "\"hello\"");
    assert_eq!(s.eval_str("(quoted)").unwrap(), "(a [b])");
}

#[test]
fn test_recursive_allocation_under_stress() {
    let mut s = stress_session();
    s.eval("(defn build [n] (if (= n 0) [] (conj (build (dec n)) [n (str n)])))")
        .unwrap();
    assert_eq!(s.eval_str("(count (build 100))").unwrap(), "100");
    assert_eq!(s.eval_str("(last (build 3))").unwrap(), "[3 \"3\"]");
}

#[test]
fn test_pending_error_payload_survives_finally() {
    let mut s = stress_session();
    assert_eq!(
        s.eval_str(
            "(try (try (throw {:data [1 2]}) (finally (vector :junk (str 1)))) (catch E e e))"
        )
        .unwrap(),
        "{:data [1 2]}"
    );
}

#[test]
fn test_garbage_is_reclaimed_after_run() {
    let mut s = Session::new();
    s.ctx.collect_garbage(&mut |_| {});
    let baseline = s.ctx.heap_stats();
    s.eval("(count (map (fn [i] [i i]) (range 100)))").unwrap();
    s.ctx.collect_garbage(&mut |_| {});
    let after = s.ctx.heap_stats();
    assert!(after.freed >= baseline.freed + 100);
    assert!(after.live <= baseline.live + 1);
}
