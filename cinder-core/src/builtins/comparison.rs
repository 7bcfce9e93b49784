// cinder-core - Comparison built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Comparison operations: =, not=, <, >, <=, >=, identical?, not

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::numeric::{self, CmpOp};
use crate::value::Value;

// ============================================================================
// Equality
// ============================================================================

fn all_equal(ctx: &Context, args: &[Value]) -> Result<bool> {
    for pair in args.windows(2) {
        if !ctx.values_equal(pair[0], pair[1])? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// (= x & more)
pub(crate) fn builtin_eq(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least("=", 1, 0));
    }
    Ok(Value::Bool(all_equal(ctx, args)?))
}

/// (not= x & more)
pub(crate) fn builtin_not_eq(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least("not=", 1, 0));
    }
    Ok(Value::Bool(!all_equal(ctx, args)?))
}

/// (identical? x y)
pub(crate) fn builtin_identical_p(
    _: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("identical?", 2, args.len()));
    }
    Ok(Value::Bool(args[0].identical(args[1])))
}

/// (not x)
pub(crate) fn builtin_not(_: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("not", 1, args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

// ============================================================================
// Ordering
// ============================================================================

/// Chained comparison: every adjacent pair must satisfy `op`. All
/// arguments are checked to be numbers even after the result is known.
fn chain(ctx: &Context, op: CmpOp, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least(op.name(), 1, 0));
    }
    numeric::check_number(op.name(), 0, args[0]).map_err(|f| f.into_error(ctx, 0))?;
    let mut result = true;
    for (i, pair) in args.windows(2).enumerate() {
        if !numeric::compare(op, pair[0], pair[1]).map_err(|f| f.into_error(ctx, i))? {
            result = false;
        }
    }
    Ok(Value::Bool(result))
}

/// (< x & more)
pub(crate) fn builtin_lt(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    chain(ctx, CmpOp::Lt, args)
}

/// (> x & more)
pub(crate) fn builtin_gt(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    chain(ctx, CmpOp::Gt, args)
}

/// (<= x & more)
pub(crate) fn builtin_le(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    chain(ctx, CmpOp::Le, args)
}

/// (>= x & more)
pub(crate) fn builtin_ge(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    chain(ctx, CmpOp::Ge, args)
}
