// cinder-core - Arithmetic built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic operations: +, -, *, /, quot, rem, mod, inc, dec, max, min
//!
//! All of these fold over the binary kernel in [`crate::numeric`], which the
//! bytecode backend also uses for its inline operators. A fault in step `i`
//! of the fold is blamed on argument `i` (or the call site for overflow).

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::numeric::{self, ArithOp, CmpOp, IntDivOp, NumFault};
use crate::value::Value;

/// Any fault of a one-argument operation belongs to that argument.
fn unary_fault(ctx: &Context, fault: NumFault) -> Error {
    ctx.arg_error(0, fault.error)
}

fn fold(ctx: &Context, op: ArithOp, args: &[Value]) -> Result<Value> {
    let mut acc =
        numeric::check_number(op.name(), 0, args[0]).map_err(|f| f.into_error(ctx, 0))?;
    for (i, arg) in args.iter().enumerate().skip(1) {
        acc = numeric::arith(op, acc, *arg).map_err(|f| f.into_error(ctx, i - 1))?;
    }
    Ok(acc)
}

// ============================================================================
// Variadic operators
// ============================================================================

/// (+ & nums)
pub(crate) fn builtin_add(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::Int(0));
    }
    fold(ctx, ArithOp::Add, args)
}

/// (- x & nums)
pub(crate) fn builtin_sub(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    match args.len() {
        0 => Err(Error::arity_at_least("-", 1, 0)),
        1 => numeric::negate(args[0]).map_err(|f| unary_fault(ctx, f)),
        _ => fold(ctx, ArithOp::Sub, args),
    }
}

/// (* & nums)
pub(crate) fn builtin_mul(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::Int(1));
    }
    fold(ctx, ArithOp::Mul, args)
}

/// (/ x & nums) - (/ x) is the reciprocal
pub(crate) fn builtin_div(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    match args.len() {
        0 => Err(Error::arity_at_least("/", 1, 0)),
        1 => numeric::arith(ArithOp::Div, Value::Int(1), args[0]).map_err(|f| unary_fault(ctx, f)),
        _ => fold(ctx, ArithOp::Div, args),
    }
}

// ============================================================================
// Integer division
// ============================================================================

fn int_div(ctx: &Context, op: IntDivOp, args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named(op.name(), 2, args.len()));
    }
    numeric::int_div(op, args[0], args[1]).map_err(|f| f.into_error(ctx, 0))
}

/// (quot n d)
pub(crate) fn builtin_quot(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    int_div(ctx, IntDivOp::Quot, args)
}

/// (rem n d)
pub(crate) fn builtin_rem(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    int_div(ctx, IntDivOp::Rem, args)
}

/// (mod n d) - result has the sign of d
pub(crate) fn builtin_mod(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    int_div(ctx, IntDivOp::Mod, args)
}

// ============================================================================
// Increment, decrement, extrema
// ============================================================================

fn step(ctx: &Context, name: &str, op: ArithOp, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named(name, 1, args.len()));
    }
    numeric::check_number(name, 0, args[0]).map_err(|f| unary_fault(ctx, f))?;
    numeric::arith(op, args[0], Value::Int(1)).map_err(|f| f.into_error(ctx, 0))
}

/// (inc x)
pub(crate) fn builtin_inc(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    step(ctx, "inc", ArithOp::Add, args)
}

/// (dec x)
pub(crate) fn builtin_dec(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    step(ctx, "dec", ArithOp::Sub, args)
}

fn extremum(ctx: &Context, name: &str, keep_new: CmpOp, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least(name, 1, 0));
    }
    let mut best = numeric::check_number(name, 0, args[0]).map_err(|f| unary_fault(ctx, f))?;
    for (i, arg) in args.iter().enumerate().skip(1) {
        let candidate = numeric::check_number(name, 0, *arg).map_err(|f| ctx.arg_error(i, f.error))?;
        if numeric::compare(keep_new, candidate, best).map_err(|f| f.into_error(ctx, i))? {
            best = candidate;
        }
    }
    Ok(best)
}

/// (max x & more)
pub(crate) fn builtin_max(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    extremum(ctx, "max", CmpOp::Gt, args)
}

/// (min x & more)
pub(crate) fn builtin_min(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    extremum(ctx, "min", CmpOp::Lt, args)
}
