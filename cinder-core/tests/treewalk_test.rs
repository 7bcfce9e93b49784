// cinder-core - Tree-walk backend integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Special forms, functions, macros and built-ins through the tree-walking
//! backend.

mod common;

use common::*;

// =============================================================================
// Literals and special forms
// =============================================================================

#[test]
fn test_literals() {
    assert_eval!("nil", "nil");
    assert_eval!("42", "42");
    assert_eval!("-7", "-7");
    assert_eval!("2.5", "2.5");
    assert_eval!("\"hi\"", "\"hi\"");
    assert_eval!(":kw", ":kw");
    assert_eval!("[1 [2 3]]", "[1 [2 3]]");
    assert_eval!("{:a 1}", "{:a 1}");
}

#[test]
fn test_quote() {
    assert_eval!("'(1 2 3)", "(1 2 3)");
    assert_eval!("'sym", "sym");
    assert_eval!("(quote (a [b] c))", "(a [b] c)");
}

#[test]
fn test_if_and_do() {
    assert_eval!("(if true 1 2)", "1");
    assert_eval!("(if nil 1 2)", "2");
    assert_eval!("(if false 1)", "nil");
    assert_eval!("(if 0 :zero-is-truthy :no)", ":zero-is-truthy");
    assert_eval!("(do 1 2 3)", "3");
    assert_eval!("(do)", "nil");
}

#[test]
fn test_let_is_sequential() {
    assert_eval!("(let [x 1 y (+ x 1)] (* x y))", "2");
    assert_eval!("(let [x 1] (let [x 2] x))", "2");
    assert_eval!("(let [] 5)", "5");
}

#[test]
fn test_def_returns_symbol() {
    let mut s = Session::new();
    assert_eq!(s.eval_str("(def x 10)").unwrap(), "x");
    assert_eq!(s.eval_str("(+ x 5)").unwrap(), "15");
    assert_eq!(s.eval_str("(def doc \"documented\" 3)").unwrap(), "doc");
    assert_eq!(s.eval_str("doc").unwrap(), "3");
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_closures_capture_environment() {
    assert_eval!("((let [n 10] (fn [x] (+ x n))) 5)", "15");
    assert_eval!(
        "(let [make (fn [n] (fn [x] (* x n))) triple (make 3)] (triple 4))",
        "12"
    );
}

#[test]
fn test_multi_arity_and_rest() {
    let mut s = Session::new();
    s.eval("(defn f ([] :none) ([x] x) ([x & more] more))").unwrap();
    assert_eq!(s.eval_str("(f)").unwrap(), ":none");
    assert_eq!(s.eval_str("(f 1)").unwrap(), "1");
    assert_eq!(s.eval_str("(f 1 2 3)").unwrap(), "(2 3)");
    assert_eq!(s.eval_str("((fn [& xs] xs))").unwrap(), "nil");
}

#[test]
fn test_named_fn_recursion() {
    assert_eval!(
        "((fn fact [n] (if (< n 2) 1 (* n (fact (- n 1))))) 10)",
        "3628800"
    );
}

#[test]
fn test_fib() {
    let mut s = Session::new();
    s.eval("(defn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))")
        .unwrap();
    assert_eq!(s.eval_str("(fib 10)").unwrap(), "55");
}

#[test]
fn test_loop_recur() {
    assert_eval!(
        "(loop [i 0 acc 0] (if (< i 10) (recur (inc i) (+ acc i)) acc))",
        "45"
    );
    // Deep iteration does not grow the call depth.
    assert_eval!("(loop [i 0] (if (< i 100000) (recur (inc i)) i))", "100000");
}

#[test]
fn test_fn_recur_with_rest() {
    assert_eval!(
        "((fn [acc & xs] (if xs (recur (+ acc (first xs)) (next xs)) acc)) 0 1 2 3)",
        "6"
    );
}

#[test]
fn test_keyword_and_map_as_functions() {
    assert_eval!("(:a {:a 1 :b 2})", "1");
    assert_eval!("({:a 1} :b)", "nil");
    assert_eval!("({:a 1} :b :default)", ":default");
    assert_eval!("(#{1 2} 2)", "2");
    assert_eval!("([10 20 30] 1)", "20");
}

// =============================================================================
// Errors and exceptions
// =============================================================================

#[test]
fn test_error_kinds() {
    assert_eval_err!("undefined-thing", ErrorKind::UnresolvedSymbol);
    assert_eval_err!("((fn [x] x))", ErrorKind::ArityMismatch);
    assert_eval_err!("(+ 1 \"a\")", ErrorKind::TypeMismatch);
    assert_eval_err!("(/ 1 0)", ErrorKind::ArithmeticError);
    assert_eval_err!("(nth [1 2] 5)", ErrorKind::IndexOutOfBounds);
    assert_eval_err!("(1 2)", ErrorKind::TypeMismatch);
    assert_eval_err!("(throw :boom)", ErrorKind::UserRaised);
    assert_eval_err!("(let [x] x)", ErrorKind::InvalidSyntax);
}

#[test]
fn test_arity_message_names_function() {
    let mut s = Session::new();
    s.eval("(defn add [x y] (+ x y))").unwrap();
    let err = s.eval("(add 1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert_eq!(
        err.message,
        "Wrong number of args (1) passed to add: expected 2"
    );
}

#[test]
fn test_recur_must_be_in_tail_position() {
    let err = eval_err("(loop [i 0] (+ 1 (recur i)))");
    assert_eq!(err.kind, ErrorKind::InvalidSyntax);
    let err = eval_err("(loop [i 0] (recur))");
    assert_eq!(err.kind, ErrorKind::InvalidSyntax);
}

#[test]
fn test_try_catch_finally() {
    assert_eval!("(try (throw :boom) (catch Exception e e))", ":boom");
    assert_eval!("(try 1 (catch Exception e 2))", "1");
    assert_eval!(
        "(try (/ 1 0) (catch Exception e (:type e)))",
        ":arithmetic-error"
    );
    assert_eval!(
        "(let [a (atom [])] (try (swap! a conj 1) (finally (swap! a conj 2))) @a)",
        "[1 2]"
    );
    assert_eval!(
        "(let [a (atom 0)] (try (try (throw :x) (finally (reset! a 1))) (catch E e @a)))",
        "1"
    );
}

#[test]
fn test_ex_info() {
    assert_eval!(
        "(try (throw (ex-info \"bad\" {:code 7})) (catch Exception e (ex-data e)))",
        "{:code 7}"
    );
    assert_eval!(
        "(try (throw (ex-info \"bad\" {})) (catch Exception e (ex-message e)))",
        "\"bad\""
    );
    let err = eval_err("(throw (ex-info \"went wrong\" {}))");
    assert_eq!(err.message, "went wrong");
}

#[test]
fn test_catch_restores_call_depth() {
    let mut s = Session::with_config(EvalConfig::default().with_max_call_depth(50));
    s.eval("(defn down [n] (down (inc n)))").unwrap();
    assert_eq!(
        s.eval_str("(try (down 0) (catch E e :overflowed))").unwrap(),
        ":overflowed"
    );
    // The catch left the depth where the try found it.
    assert_eq!(
        s.eval_str("(try (down 0) (catch E e :again))").unwrap(),
        ":again"
    );
}

#[test]
fn test_stack_overflow() {
    let mut s = Session::with_config(EvalConfig::default().with_max_call_depth(100));
    s.eval("(defn forever [n] (+ 1 (forever n)))").unwrap();
    let err = s.eval("(forever 1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
    // The context is still usable.
    assert_eq!(s.eval_str("(+ 1 2)").unwrap(), "3");
}

#[test]
fn test_default_call_depth_fits_an_ordinary_thread() {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let mut s = Session::new();
            s.eval("(defn f [n] (if (= n 0) 0 (+ 1 (f (- n 1)))))").unwrap();
            assert_eq!(s.eval_str("(f 995)").unwrap(), "995");
            assert_eq!(s.eval("(f 5000)").unwrap_err().kind, ErrorKind::StackOverflow);
            assert_eq!(s.eval_str("(f 10)").unwrap(), "10");
        })
        .unwrap();
    worker.join().unwrap();
}

// =============================================================================
// Macros and the prelude
// =============================================================================

#[test]
fn test_user_macro() {
    let mut s = Session::new();
    s.eval("(defmacro unless [c & body] `(if ~c nil (do ~@body)))").unwrap();
    assert_eq!(s.eval_str("(unless false 1 2)").unwrap(), "2");
    assert_eq!(s.eval_str("(unless true 1 2)").unwrap(), "nil");
}

#[test]
fn test_macro_defined_in_same_do() {
    assert_eval!("(do (defmacro two [] 2) (two))", "2");
}

#[test]
fn test_prelude_macros() {
    assert_eval!("(when true 1 2)", "2");
    assert_eval!("(when false 1)", "nil");
    assert_eval!("(when-not false :yes)", ":yes");
    assert_eval!("(if-not false :a :b)", ":a");
    assert_eval!("(cond false 1 nil 2 :else 3)", "3");
    assert_eval!("(cond)", "nil");
    assert_eval!("(and 1 2 3)", "3");
    assert_eval!("(and 1 nil 3)", "nil");
    assert_eval!("(and)", "true");
    assert_eval!("(or nil false 7)", "7");
    assert_eval!("(or)", "nil");
    assert_eval!("(-> 5 (- 2) inc)", "4");
    assert_eval!("(->> [1 2 3] (map inc) (reduce +))", "9");
}

#[test]
fn test_gensyms_are_hygienic() {
    // The `and#` temp inside `and` does not capture a user binding.
    assert_eval!("(let [x 1] (and x (+ x 1)))", "2");
}

#[test]
fn test_macroexpand() {
    assert_eval!("(macroexpand-1 '(when a b))", "(if a (do b))");
    assert_eval!("(macroexpand '(if-not a b))", "(if a nil b)");
    assert_eval!("(macroexpand-1 '(+ 1 2))", "(+ 1 2)");
}

#[test]
fn test_macro_expansion_depth() {
    let mut s = Session::new();
    s.eval("(defmacro loop-forever [] '(loop-forever))").unwrap();
    let err = s.eval("(loop-forever)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::MacroExpansionDepthExceeded);
}

// =============================================================================
// Built-ins
// =============================================================================

#[test]
fn test_arithmetic() {
    assert_eval!("(+)", "0");
    assert_eval!("(+ 1 2 3)", "6");
    assert_eval!("(- 5)", "-5");
    assert_eval!("(* 2 2.5)", "5.0");
    assert_eval!("(/ 10 4)", "2.5");
    assert_eval!("(/ 10 5)", "2");
    assert_eval!("(quot 7 2)", "3");
    assert_eval!("(rem -7 2)", "-1");
    assert_eval!("(mod -7 2)", "1");
    assert_eval!("(< 1 2 3)", "true");
    assert_eval!("(< 1 3 2)", "false");
    assert_eval!("(= [1 2] '(1 2))", "true");
}

#[test]
fn test_collections() {
    assert_eval!("(conj [1 2] 3)", "[1 2 3]");
    assert_eval!("(conj '(1 2) 0)", "(0 1 2)");
    assert_eval!("(assoc {:a 1} :b 2)", "{:a 1, :b 2}");
    assert_eval!("(dissoc {:a 1 :b 2} :a)", "{:b 2}");
    assert_eval!("(get {:a 1} :a)", "1");
    assert_eval!("(count [1 2 3])", "3");
    assert_eval!("(first nil)", "nil");
    assert_eval!("(rest [1])", "()");
    assert_eval!("(next [1])", "nil");
    assert_eval!("(cons 0 [1 2])", "(0 1 2)");
    assert_eval!("(concat [1] '(2) nil [3])", "(1 2 3)");
    assert_eval!("(contains? #{1 2} 2)", "true");
    assert_eval!("(keys {:a 1 :b 2})", "(:a :b)");
    assert_eval!("(apply + 1 [2 3])", "6");
}

#[test]
fn test_atoms() {
    assert_eval!("(let [a (atom 1)] (swap! a + 10) @a)", "11");
    assert_eval!("(let [a (atom 1)] (reset! a 5))", "5");
    assert_eval!("(let [a (atom 1)] (compare-and-set! a 1 2))", "true");
    assert_eval!("(let [a (atom 1)] (compare-and-set! a 3 2) @a)", "1");
}

#[test]
fn test_output_capture() {
    let mut s = Session::new();
    s.ctx.capture_output();
    s.eval("(println \"hello\" 42)").unwrap();
    s.eval("(prn \"q\")").unwrap();
    assert_eq!(s.ctx.take_output(), "hello 42\n\"q\"\n");
}
