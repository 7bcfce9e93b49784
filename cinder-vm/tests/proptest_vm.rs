// cinder-vm - Property-based VM tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Properties of compiled code:
//! - loops compute what their closed form says
//! - nested scopes leave the operand stack balanced
//! - errors leave no frames or operands behind

mod common;

use common::*;
use proptest::prelude::*;

fn arb_small_int() -> impl Strategy<Value = i64> {
    -1000i64..1000i64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn loop_sum_matches_closed_form(n in 0i64..500) {
        let src = format!("(loop [i 0 acc 0] (if (< i {}) (recur (inc i) (+ acc i)) acc))", n);
        prop_assert_eq!(compile_and_run(&src), (n * (n - 1) / 2).max(0).to_string());
    }

    #[test]
    fn nested_lets_resolve_innermost_binding(values in prop::collection::vec(arb_small_int(), 1..12)) {
        // (let [x v0] (let [x v1] ... [x depth]))
        let mut src = String::from("[x (count [");
        src.push_str(&values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "));
        src.push_str("])]");
        for v in values.iter().rev() {
            src = format!("(let [x {} y (+ x 1)] {})", v, src);
        }
        let expected = format!("[{} {}]", values[values.len() - 1], values.len());
        prop_assert_eq!(compile_and_run(&src), expected);
    }

    #[test]
    fn errors_leave_vm_clean(divisors in prop::collection::vec(-3i64..3, 1..8)) {
        let mut s = Session::new();
        let list = divisors.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ");
        let src = format!("(let [f (fn [d] (let [q (/ 60 d)] [q]))] (map f [{}]))", list);
        let result = s.eval(&src);
        prop_assert_eq!(result.is_err(), divisors.contains(&0));
        prop_assert_eq!(s.vm.stack_depth(), 0);
        prop_assert_eq!(s.ctx.call_depth(), 0);
    }
}
