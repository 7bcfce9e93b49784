// cinder-core - Collector integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Retained values survive forced collections; unretained ones are
//! reclaimed, as observed through the allocation counters.

mod common;

use common::*;

fn stress_session() -> Session {
    Session::with_config(EvalConfig::default().with_stress_gc(true))
}

#[test]
fn test_retained_values_survive_forced_collection() {
    let mut s = stress_session();
    s.eval("(def keep [[1 2] {:a \"x\"} #{:s}])").unwrap();
    s.eval("(def drop-me [[3 4] [5 6]])").unwrap();
    s.eval("(def drop-me nil)").unwrap();
    s.ctx.collect_garbage(&mut |_| {});
    assert_eq!(
        s.eval_str("keep").unwrap(),
        "[[1 2] {:a \"x\"} #{:s}]"
    );
}

#[test]
fn test_unretained_values_are_reclaimed() {
    let mut s = Session::new();
    s.ctx.collect_garbage(&mut |_| {});
    let baseline = s.ctx.heap_stats();

    s.eval("(def kept (vector 1 2 3))").unwrap();
    s.eval("(count (map (fn [i] [i i]) (range 100)))").unwrap();
    s.ctx.collect_garbage(&mut |_| {});
    let after = s.ctx.heap_stats();

    assert!(after.allocated > baseline.allocated + 100);
    assert!(after.freed >= baseline.freed + 100);
    // Only the kept vector (plus nothing else new) stays live.
    assert_eq!(after.live, baseline.live + 1);
    assert_eq!(s.eval_str("kept").unwrap(), "[1 2 3]");
}

#[test]
fn test_closures_keep_captured_values_alive() {
    let mut s = stress_session();
    s.eval("(def f (let [xs [1 2 3]] (fn [] xs)))").unwrap();
    for _ in 0..3 {
        s.eval("[:garbage :garbage]").unwrap();
    }
    assert_eq!(s.eval_str("(f)").unwrap(), "[1 2 3]");
}

#[test]
fn test_atoms_keep_contents_alive() {
    let mut s = stress_session();
    s.eval("(def a (atom nil))").unwrap();
    s.eval("(reset! a {:nested [1 [2]]})").unwrap();
    s.eval("(list 1 2 3)").unwrap();
    assert_eq!(s.eval_str("@a").unwrap(), "{:nested [1 [2]]}");
}

#[test]
fn test_allocation_heavy_program_under_stress() {
    let mut s = stress_session();
    s.eval(
        "(defn build [n acc] (if (= n 0) acc (build (dec n) (conj acc [n (str n)]))))",
    )
    .unwrap();
    s.eval("(def big (build 200 []))").unwrap();
    s.eval("(def small (build 3 []))").unwrap();
    assert_eq!(s.eval_str("(count big)").unwrap(), "200");
    assert_eq!(s.eval_str("small").unwrap(), "[[3 \"3\"] [2 \"2\"] [1 \"1\"]]");
    assert!(s.ctx.heap_stats().collections > 0);
}

#[test]
fn test_heap_stats_builtin() {
    assert_eval!(
        "(let [s (heap-stats)] [(contains? s :live) (contains? s :collections)])",
        "[true true]"
    );
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

#[test]
fn test_pending_arguments_survive_nested_calls() {
    let mut s = stress_session();
    s.eval("(defn pair [a b] [a b])").unwrap();
    assert_eq!(
        s.eval_str("(pair (str \"x\" 1) (pair (str \"y\") (str \"z\")))").unwrap(),
        "[\"x1\" [\"y\" \"z\"]]"
    );
}

#[test]
fn test_partial_collection_literals_survive_calls() {
    let mut s = stress_session();
    assert_eq!(
        s.eval_str("[(str \"a\") ((fn [] (str \"b\"))) {:k (str \"c\")}]").unwrap(),
        "[\"a\" \"b\" {:k \"c\"}]"
    );
    assert_eq!(
        s.eval_str("(count #{(str \"s\") ((fn [] [:t]))})").unwrap(),
        "2"
    );
}

#[test]
fn test_try_result_survives_finally() {
    let mut s = stress_session();
    assert_eq!(
        s.eval_str("(try (str \"kept\" 1) (finally ((fn [] [:garbage]))))").unwrap(),
        "\"kept1\""
    );
}

#[test]
fn test_loop_bindings_survive_recur() {
    let mut s = stress_session();
    assert_eq!(
        s.eval_str("(loop [i 0 acc []] (if (< i 20) (recur (inc i) (conj acc (str i))) (count acc)))")
            .unwrap(),
        "20"
    );
    assert_eq!(
        s.eval_str("(let [xs [1 2]] ((fn [] (loop [n 3] (if (= n 0) xs (recur (dec n)))))))")
            .unwrap(),
        "[1 2]"
    );
}

#[test]
fn test_long_loop_runs_in_a_small_heap() {
    let mut s = Session::with_config(EvalConfig::default().with_max_heap_objects(20_000));
    assert_eq!(
        s.eval_str("(loop [i 0 acc []] (if (< i 50000) (recur (inc i) [i]) acc))")
            .unwrap(),
        "[49999]"
    );
    assert!(s.ctx.heap_stats().collections > 0);
}

#[test]
fn test_long_recursion_runs_in_a_small_heap() {
    let mut s = Session::with_config(EvalConfig::default().with_max_heap_objects(20_000));
    s.eval("(defn churn [n] (if (= n 0) :done (do [n (str n)] (churn (dec n)))))")
        .unwrap();
    for _ in 0..30 {
        assert_eq!(s.eval_str("(churn 900)").unwrap(), ":done");
    }
}

#[test]
fn test_macro_embedded_functions_are_reclaimed() {
    let mut s = Session::new();
    s.eval("(defmacro m [] (list (fn [] 1)))").unwrap();
    s.eval("(m)").unwrap();
    s.ctx.collect_garbage(&mut |_| {});
    let before = s.ctx.heap_stats();
    for _ in 0..2000 {
        assert_eq!(s.eval_str("(m)").unwrap(), "1");
    }
    s.ctx.collect_garbage(&mut |_| {});
    let after = s.ctx.heap_stats();
    assert!(after.live <= before.live + 2, "{:?} -> {:?}", before, after);
    assert!(s.ctx.heap.embedded_count() <= 2);
}

#[test]
fn test_closure_keeps_its_embedded_functions() {
    let mut s = stress_session();
    s.eval("(defmacro inline-adder [n] (list (fn [x] (+ x n)) 'y))").unwrap();
    s.eval("(defn add5 [y] (inline-adder 5))").unwrap();
    for _ in 0..3 {
        s.eval("[:garbage (str :garbage)]").unwrap();
    }
    s.ctx.collect_garbage(&mut |_| {});
    assert_eq!(s.eval_str("(add5 10)").unwrap(), "15");
}
