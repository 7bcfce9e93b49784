// cinder-core - Predicate built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type and numeric predicates.

use crate::backend::Caller;
use crate::context::Context;
use crate::equality::is_sequential;
use crate::error::{Error, Result};
use crate::numeric;
use crate::value::Value;

use super::{arg_type_error, int_arg};

fn one_arg(name: &str, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named(name, 1, args.len()));
    }
    Ok(args[0])
}

// ============================================================================
// Type predicates
// ============================================================================

macro_rules! type_predicate {
    ($fn_name:ident, $name:literal, $pattern:pat) => {
        #[doc = concat!("(", $name, " x)")]
        pub(crate) fn $fn_name(_: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
            let x = one_arg($name, args)?;
            Ok(Value::Bool(matches!(x, $pattern)))
        }
    };
}

type_predicate!(builtin_nil_p, "nil?", Value::Nil);
type_predicate!(builtin_number_p, "number?", Value::Int(_) | Value::Float(_));
type_predicate!(builtin_int_p, "int?", Value::Int(_));
type_predicate!(builtin_string_p, "string?", Value::Str(_));
type_predicate!(builtin_symbol_p, "symbol?", Value::Symbol(_));
type_predicate!(builtin_keyword_p, "keyword?", Value::Keyword(_));
type_predicate!(builtin_list_p, "list?", Value::List(_));
type_predicate!(builtin_vector_p, "vector?", Value::Vector(_));
type_predicate!(builtin_map_p, "map?", Value::Map(_));
type_predicate!(builtin_set_p, "set?", Value::Set(_));
type_predicate!(builtin_fn_p, "fn?", Value::Fn(_));
type_predicate!(builtin_atom_p, "atom?", Value::Atom(_));

/// (sequential? x) - true for lists and vectors
pub(crate) fn builtin_sequential_p(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let x = one_arg("sequential?", args)?;
    Ok(Value::Bool(is_sequential(ctx, x)))
}

// ============================================================================
// Numeric predicates
// ============================================================================

fn sign_test(ctx: &Context, name: &str, args: &[Value], test: fn(f64) -> bool) -> Result<Value> {
    let x = one_arg(name, args)?;
    let x = numeric::check_number(name, 0, x).map_err(|f| ctx.arg_error(0, f.error))?;
    let n = match x {
        Value::Int(n) => n as f64,
        Value::Float(n) => n,
        _ => f64::NAN,
    };
    Ok(Value::Bool(test(n)))
}

/// (zero? x)
pub(crate) fn builtin_zero_p(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    sign_test(ctx, "zero?", args, |n| n == 0.0)
}

/// (pos? x)
pub(crate) fn builtin_pos_p(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    sign_test(ctx, "pos?", args, |n| n > 0.0)
}

/// (neg? x)
pub(crate) fn builtin_neg_p(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    sign_test(ctx, "neg?", args, |n| n < 0.0)
}

/// (even? n)
pub(crate) fn builtin_even_p(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let x = one_arg("even?", args)?;
    Ok(Value::Bool(int_arg(ctx, "even?", 0, x)? % 2 == 0))
}

/// (odd? n)
pub(crate) fn builtin_odd_p(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let x = one_arg("odd?", args)?;
    match x {
        Value::Int(n) => Ok(Value::Bool(n % 2 != 0)),
        other => Err(arg_type_error(ctx, "odd?", 0, "integer", other)),
    }
}
