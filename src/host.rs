// cinder - Demo host module
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! A small native math module exposed through the host-function bridge.
//!
//! Arguments and results are 32-bit integers, as they would be when
//! marshalled across a foreign module boundary. Overflow is reported as a
//! host failure rather than wrapping.

use cinder_embed::{Context, Engine, Error, Result, Value, from_value};

fn int_result(op: &str, n: Option<i32>) -> Result<Value> {
    n.map(|n| Value::Int(i64::from(n)))
        .ok_or_else(|| Error::arithmetic(format!("{} overflowed a 32-bit integer", op)))
}

fn arg(ctx: &Context, args: &[Value], index: usize) -> Result<i32> {
    from_value(ctx, args[index])
}

fn fibonacci(n: i32) -> Option<i32> {
    if n <= 1 {
        return Some(n);
    }
    let (mut a, mut b) = (0i32, 1i32);
    for _ in 2..=n {
        (a, b) = (b, a.checked_add(b)?);
    }
    Some(b)
}

fn factorial(n: i32) -> Option<i32> {
    (2..=n).try_fold(1i32, |acc, i| acc.checked_mul(i))
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn is_prime(n: i32) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2i32;
    while i.checked_mul(i).is_some_and(|sq| sq <= n) {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Register the `host/...` functions on `engine`.
pub fn register(engine: &mut Engine) -> Result<()> {
    engine.register_fn("host/add", 2, |ctx, args| {
        int_result("add", arg(ctx, args, 0)?.checked_add(arg(ctx, args, 1)?))
    })?;
    engine.register_fn("host/multiply", 2, |ctx, args| {
        int_result("multiply", arg(ctx, args, 0)?.checked_mul(arg(ctx, args, 1)?))
    })?;
    engine.register_fn("host/fibonacci", 1, |ctx, args| {
        int_result("fibonacci", fibonacci(arg(ctx, args, 0)?))
    })?;
    engine.register_fn("host/factorial", 1, |ctx, args| {
        int_result("factorial", factorial(arg(ctx, args, 0)?))
    })?;
    engine.register_fn("host/gcd", 2, |ctx, args| {
        Ok(Value::Int(i64::from(gcd(arg(ctx, args, 0)?, arg(ctx, args, 1)?))))
    })?;
    engine.register_fn("host/prime?", 1, |ctx, args| {
        Ok(Value::Bool(is_prime(arg(ctx, args, 0)?)))
    })?;
    log::debug!("registered demo host module");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_embed::{BackendKind, ErrorKind};

    #[test]
    fn test_math() {
        assert_eq!(fibonacci(10), Some(55));
        assert_eq!(fibonacci(50), None);
        assert_eq!(factorial(5), Some(120));
        assert_eq!(factorial(13), None);
        assert_eq!(gcd(48, 18), 6);
        assert!(is_prime(97));
        assert!(!is_prime(1));
        assert!(is_prime(i32::MAX));
    }

    #[test]
    fn test_module_from_code() {
        for kind in BackendKind::ALL {
            let mut engine = Engine::new(kind).unwrap();
            register(&mut engine).unwrap();
            assert_eq!(
                engine
                    .eval_to_string("[(host/add 2 3) (host/fibonacci 10) (host/prime? 7)]")
                    .unwrap(),
                "[5 55 true]"
            );
            let err = engine.eval("(host/factorial 20)").unwrap_err();
            assert_eq!(err.kind, ErrorKind::HostCallFailure);
            let err = engine.eval("(host/add 1 4294967296)").unwrap_err();
            assert_eq!(err.kind, ErrorKind::HostCallFailure);
        }
    }
}
