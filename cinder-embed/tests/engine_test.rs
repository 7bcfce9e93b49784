// cinder-embed integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The embedding API on both backends.

mod common;

use std::collections::HashMap;

use cinder_embed::{Keyword, render_error};
use common::*;

// =============================================================================
// Evaluation
// =============================================================================

mod evaluation {
    use super::*;

    #[test]
    fn eval_returns_last_value() {
        for mut engine in engines() {
            assert_eq!(engine.eval_to_string("(def x 20) (+ x 22)").unwrap(), "42");
            assert_eq!(engine.eval_as::<i64>("(* x 2)").unwrap(), 40);
        }
    }

    #[test]
    fn fib_on_both_backends() {
        for mut engine in engines() {
            engine
                .eval("(defn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))")
                .unwrap();
            assert_eq!(engine.eval_as::<i64>("(fib 20)").unwrap(), 6765, "{}", engine.backend_kind());
        }
    }

    #[test]
    fn errors_carry_kind_and_location() {
        for mut engine in engines() {
            let err = engine.eval("(+ 1 (/ 10 0))").unwrap_err();
            assert_eq!(err.kind, ErrorKind::ArithmeticError);
            assert_eq!(err.location, loc(1, 12));
        }
    }

    #[test]
    fn reader_errors_are_invalid_syntax() {
        for mut engine in engines() {
            let err = engine.eval("(+ 1\n  [2 3").unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidSyntax);
            assert!(err.location.is_some());
        }
    }

    #[test]
    fn eval_file_reads_source() {
        let path = std::env::temp_dir().join(format!("cinder-embed-{}.clj", std::process::id()));
        std::fs::write(&path, "(defn twice [x] (* 2 x))\n(twice 21)\n").unwrap();
        for mut engine in engines() {
            let v = engine.eval_file(&path).unwrap();
            assert_eq!(engine.repr(v), "42");
        }
        std::fs::remove_file(&path).unwrap();

        let mut engine = Engine::new(BackendKind::Vm).unwrap();
        let err = engine.eval_file("/nonexistent/cinder/file.clj").unwrap_err();
        assert_eq!(err.kind, ErrorKind::HostCallFailure);
    }

    #[test]
    fn output_is_captured() {
        for mut engine in engines() {
            engine.capture_output();
            engine.eval("(println \"hi\" 1) (prn :k)").unwrap();
            assert_eq!(engine.take_output(), "hi 1\n:k\n");
        }
    }
}

// =============================================================================
// Globals and conversion
// =============================================================================

mod globals {
    use super::*;

    #[test]
    fn set_and_get() {
        for mut engine in engines() {
            engine.set("greeting", "hello").unwrap();
            engine.set("nums", vec![1i64, 2, 3]).unwrap();
            assert_eq!(engine.eval_to_string("(str greeting \" world\")").unwrap(), "\"hello world\"");
            assert_eq!(engine.eval_to_string("(reduce + nums)").unwrap(), "6");
            assert_eq!(engine.get_as::<String>("greeting").unwrap().as_deref(), Some("hello"));
            assert_eq!(engine.get_as::<i64>("missing").unwrap(), None);
            assert!(engine.get_as::<i64>("greeting").is_err());
        }
    }

    #[test]
    fn maps_and_keywords() {
        let mut engine = Engine::new(BackendKind::Vm).unwrap();
        let mut config = HashMap::new();
        config.insert("port".to_string(), 8080i64);
        engine.set("config", config).unwrap();
        assert_eq!(engine.eval_as::<i64>("(:port config)").unwrap(), 8080);
        engine.set("mode", Keyword("fast".into())).unwrap();
        assert_eq!(engine.eval_to_string("mode").unwrap(), ":fast");
        let back: HashMap<String, Vec<i64>> = engine.eval_as("{:a [1 2] \"b\" []}").unwrap();
        assert_eq!(back["a"], vec![1, 2]);
        assert!(back["b"].is_empty());
    }
}

// =============================================================================
// Host functions
// =============================================================================

mod host_functions {
    use super::*;

    fn register_gcd(engine: &mut Engine) {
        engine
            .register_fn("host/gcd", 2, |ctx, args| {
                let mut a: i64 = from_value(ctx, args[0])?;
                let mut b: i64 = from_value(ctx, args[1])?;
                while b != 0 {
                    (a, b) = (b, a % b);
                }
                Ok(Value::Int(a.abs()))
            })
            .unwrap();
    }

    #[test]
    fn callable_from_code() {
        for mut engine in engines() {
            register_gcd(&mut engine);
            assert_eq!(engine.eval_to_string("(host/gcd 48 18)").unwrap(), "6");
            assert_eq!(engine.eval_to_string("(map (fn [n] (host/gcd n 12)) [8 9])").unwrap(), "(4 3)");
        }
    }

    #[test]
    fn arity_is_fixed() {
        for mut engine in engines() {
            register_gcd(&mut engine);
            let err = engine.eval("(host/gcd 1)").unwrap_err();
            assert_eq!(err.kind, ErrorKind::ArityMismatch);
            assert_eq!(err.message, "Wrong number of args (1) passed to host/gcd: expected 2");
            assert_eq!(err.location, loc(1, 1));
        }
    }

    #[test]
    fn failures_are_wrapped() {
        for mut engine in engines() {
            register_gcd(&mut engine);
            let err = engine.eval("(do\n  (host/gcd 1 \"x\"))").unwrap_err();
            assert_eq!(err.kind, ErrorKind::HostCallFailure);
            assert!(err.message.starts_with("Host function host/gcd failed:"), "{}", err.message);
            assert_eq!(err.location, loc(2, 3));
            // Host failures are catchable like any other error.
            assert_eq!(
                engine
                    .eval_to_string("(try (host/gcd 1 nil) (catch E e (:type e)))")
                    .unwrap(),
                ":host-call-failure"
            );
        }
    }

    #[test]
    fn host_functions_can_allocate() {
        for mut engine in engines() {
            engine
                .register_fn("host/shout", 1, |ctx, args| {
                    let s: String = from_value(ctx, args[0])?;
                    ctx.alloc_str(&s.to_uppercase())
                })
                .unwrap();
            assert_eq!(engine.eval_to_string("(host/shout \"hey\")").unwrap(), "\"HEY\"");
        }
    }
}

// =============================================================================
// Invocation from the host
// =============================================================================

mod invocation {
    use super::*;

    #[test]
    fn invoke_by_name() {
        for mut engine in engines() {
            engine.eval("(defn add [x y] (+ x y))").unwrap();
            let v = engine.invoke("add", &[Value::Int(2), Value::Int(3)]).unwrap();
            assert_eq!(engine.repr(v), "5");
            let v = engine.invoke("+", &[Value::Int(1), Value::Int(2)]).unwrap();
            assert_eq!(engine.repr(v), "3");
        }
    }

    #[test]
    fn invoke_errors() {
        for mut engine in engines() {
            engine.eval("(defn add [x y] (+ x y))").unwrap();
            let err = engine.invoke("nope", &[]).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);
            let err = engine.invoke("add", &[Value::Int(1)]).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ArityMismatch);
            let err = engine.invoke("add", &[Value::Int(1), Value::Nil]).unwrap_err();
            assert_eq!(err.kind, ErrorKind::TypeMismatch);
            // The engine is still usable afterwards.
            let v = engine.invoke("add", &[Value::Int(1), Value::Int(1)]).unwrap();
            assert_eq!(engine.repr(v), "2");
        }
    }

    #[test]
    fn invoke_closure_value() {
        for mut engine in engines() {
            let f = engine.eval("(let [n 10] (fn [x] (* x n)))").unwrap();
            let id = engine.pin(f);
            engine.eval("(count (map str (range 50)))").unwrap();
            engine.collect_garbage();
            let v = engine.call(f, &[Value::Int(4)]).unwrap();
            assert_eq!(engine.repr(v), "40");
            assert!(engine.unpin(id).is_some());
        }
    }
}

// =============================================================================
// Heap
// =============================================================================

mod heap {
    use super::*;

    #[test]
    fn collect_garbage_reclaims_unreachable_values() {
        for mut engine in engines() {
            engine.collect_garbage();
            let before = engine.heap_stats();
            engine.eval("(count (map (fn [i] [i]) (range 200)))").unwrap();
            let freed = engine.collect_garbage();
            assert!(freed >= 200);
            assert!(engine.heap_stats().live <= before.live + 1);
        }
    }

    #[test]
    fn macro_embedded_objects_do_not_accumulate() {
        for mut engine in engines() {
            engine.eval("(defmacro m [] (list (fn [] 1)))").unwrap();
            engine.eval("(m)").unwrap();
            engine.collect_garbage();
            let before = engine.heap_stats();
            for _ in 0..2000 {
                assert_eq!(engine.eval_as::<i64>("(m)").unwrap(), 1);
            }
            engine.collect_garbage();
            let after = engine.heap_stats();
            assert!(after.live <= before.live + 2, "{:?} -> {:?}", before, after);
        }
    }

    #[test]
    fn heap_exhaustion_terminates_engine() {
        for kind in BackendKind::ALL {
            let config = EvalConfig::default().with_max_heap_objects(3_000);
            let mut engine = Engine::with_config(kind, config).unwrap();
            let err = engine
                .eval("(loop [acc [] i 0] (recur (conj acc (str i)) (inc i)))")
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::HeapExhausted);
            assert!(engine.context().is_terminated());
            assert_eq!(engine.eval("1").unwrap_err().kind, ErrorKind::HeapExhausted);
            assert_eq!(engine.invoke("+", &[]).unwrap_err().kind, ErrorKind::HeapExhausted);
        }
    }

    #[test]
    fn stack_overflow_is_recoverable() {
        for kind in BackendKind::ALL {
            let config = EvalConfig::default().with_max_call_depth(64);
            let mut engine = Engine::with_config(kind, config).unwrap();
            engine.eval("(defn spin [n] (+ 1 (spin n)))").unwrap();
            let err = engine.eval("(spin 0)").unwrap_err();
            assert_eq!(err.kind, ErrorKind::StackOverflow);
            assert_eq!(engine.eval_to_string("(+ 1 1)").unwrap(), "2");
        }
    }

    #[test]
    fn default_call_depth_fits_an_ordinary_thread() {
        let worker = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                for mut engine in engines() {
                    engine.eval("(defn f [n] (if (= n 0) 0 (+ 1 (f (- n 1)))))").unwrap();
                    assert_eq!(engine.eval_as::<i64>("(f 995)").unwrap(), 995);
                    let err = engine.eval("(f 5000)").unwrap_err();
                    assert_eq!(err.kind, ErrorKind::StackOverflow);
                }
            })
            .unwrap();
        worker.join().unwrap();
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn rendered_error_points_at_argument() {
    let source = "(defn add [x y]\n  (+ x y))\n(add 1 \"hello\")";
    for mut engine in engines() {
        let err = engine.eval(source).unwrap_err();
        assert_eq!(
            render_error(&err, source, "demo.clj"),
            format!("demo.clj:2:3: {}\n2 |   (+ x y))\n  |   ^", err.message)
        );
    }
}
