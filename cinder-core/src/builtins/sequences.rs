// cinder-core - Sequence built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Sequence operations: first, second, last, rest, next, cons, count, nth,
//! seq, concat, empty?, reverse, range
//!
//! Sequences are eager. Anything [`seq_values`] accepts can be walked;
//! results are lists.

use im::Vector;

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;

use super::{arg_type_error, int_arg, seq_values};

fn one_coll(ctx: &mut Context, name: &str, args: &[Value]) -> Result<Vector<Value>> {
    if args.len() != 1 {
        return Err(Error::arity_named(name, 1, args.len()));
    }
    seq_values(ctx, name, 0, args[0])
}

// ============================================================================
// Access
// ============================================================================

/// (first coll)
pub(crate) fn builtin_first(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let items = one_coll(ctx, "first", args)?;
    Ok(items.front().copied().unwrap_or(Value::Nil))
}

/// (second coll)
pub(crate) fn builtin_second(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let items = one_coll(ctx, "second", args)?;
    Ok(items.get(1).copied().unwrap_or(Value::Nil))
}

/// (last coll)
pub(crate) fn builtin_last(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let items = one_coll(ctx, "last", args)?;
    Ok(items.back().copied().unwrap_or(Value::Nil))
}

/// (rest coll) - always a list, possibly empty
pub(crate) fn builtin_rest(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let items = one_coll(ctx, "rest", args)?;
    let rest = if items.is_empty() {
        Vector::new()
    } else {
        items.skip(1)
    };
    ctx.alloc_list(rest)
}

/// (next coll) - like rest, but nil when nothing remains
pub(crate) fn builtin_next(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let items = one_coll(ctx, "next", args)?;
    if items.len() <= 1 {
        return Ok(Value::Nil);
    }
    ctx.alloc_list(items.skip(1))
}

/// (nth coll index) or (nth coll index not-found)
pub(crate) fn builtin_nth(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("nth", 2, 3, args.len()));
    }
    let items = seq_values(ctx, "nth", 0, args[0])?;
    let index = int_arg(ctx, "nth", 1, args[1])?;
    if index >= 0
        && let Some(item) = items.get(index as usize)
    {
        return Ok(*item);
    }
    match args.get(2) {
        Some(default) => Ok(*default),
        None => Err(ctx.arg_error(1, Error::index_out_of_bounds(index, items.len()))),
    }
}

/// (count coll)
pub(crate) fn builtin_count(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("count", 1, args.len()));
    }
    let coll = args[0];
    let n = match coll {
        Value::Map(_) => ctx.map_of(coll)?.map_or(0, |m| m.len()),
        Value::Set(_) => ctx.set_of(coll)?.map_or(0, |s| s.len()),
        Value::Str(_) => ctx.str_of(coll)?.map_or(0, |s| s.chars().count()),
        Value::List(_) | Value::Vector(_) => ctx.seq_of(coll)?.map_or(0, |s| s.len()),
        Value::Nil => 0,
        other => return Err(arg_type_error(ctx, "count", 0, "collection", other)),
    };
    Ok(Value::Int(n as i64))
}

/// (empty? coll)
pub(crate) fn builtin_empty_p(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let items = one_coll(ctx, "empty?", args)?;
    Ok(Value::Bool(items.is_empty()))
}

// ============================================================================
// Construction
// ============================================================================

/// (cons x coll)
pub(crate) fn builtin_cons(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("cons", 2, args.len()));
    }
    let mut items = seq_values(ctx, "cons", 1, args[1])?;
    items.push_front(args[0]);
    ctx.alloc_list(items)
}

/// (seq coll) - nil for an empty collection
pub(crate) fn builtin_seq(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let items = one_coll(ctx, "seq", args)?;
    if items.is_empty() {
        return Ok(Value::Nil);
    }
    if matches!(args[0], Value::List(_)) {
        return Ok(args[0]);
    }
    ctx.alloc_list(items)
}

/// (concat & colls)
pub(crate) fn builtin_concat(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let mut out = Vector::new();
    for (i, coll) in args.iter().enumerate() {
        out.append(seq_values(ctx, "concat", i, *coll)?);
    }
    ctx.alloc_list(out)
}

/// (reverse coll)
pub(crate) fn builtin_reverse(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let items = one_coll(ctx, "reverse", args)?;
    ctx.list_from(items.iter().rev().copied())
}

/// (range end), (range start end) or (range start end step)
pub(crate) fn builtin_range(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let (start, end, step) = match args.len() {
        1 => (0, int_arg(ctx, "range", 0, args[0])?, 1),
        2 => (
            int_arg(ctx, "range", 0, args[0])?,
            int_arg(ctx, "range", 1, args[1])?,
            1,
        ),
        3 => (
            int_arg(ctx, "range", 0, args[0])?,
            int_arg(ctx, "range", 1, args[1])?,
            int_arg(ctx, "range", 2, args[2])?,
        ),
        n => return Err(Error::arity_range("range", 1, 3, n)),
    };
    if step == 0 {
        return Err(ctx.arg_error(2, Error::arithmetic("range step must not be zero")));
    }
    let mut items = Vector::new();
    let mut i = start;
    while (step > 0 && i < end) || (step < 0 && i > end) {
        items.push_back(Value::Int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    ctx.alloc_list(items)
}
