// cinder-core - Higher-order built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Functions that call functions: apply, map, filter, reduce
//!
//! Callees run through the [`Caller`] handed to every native, so closures
//! execute on whichever backend is active.

use im::Vector;

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;

use super::seq_values;

/// (apply f args* coll)
pub(crate) fn builtin_apply(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("apply", 2, args.len()));
    }
    let last = args.len() - 1;
    let mut call_args: Vec<Value> = args[1..last].to_vec();
    call_args.extend(seq_values(ctx, "apply", last, args[last])?);
    caller.call(ctx, args[0], &call_args)
}

/// (map f coll & colls) - stops at the shortest collection
pub(crate) fn builtin_map(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("map", 2, args.len()));
    }
    let f = args[0];
    let colls = args[1..]
        .iter()
        .enumerate()
        .map(|(i, coll)| seq_values(ctx, "map", i + 1, *coll))
        .collect::<Result<Vec<_>>>()?;
    let len = colls.iter().map(|c| c.len()).min().unwrap_or(0);

    let mut out = Vector::new();
    let mut call_args = Vec::with_capacity(colls.len());
    for i in 0..len {
        call_args.clear();
        call_args.extend(colls.iter().map(|c| c[i]));
        out.push_back(caller.call(ctx, f, &call_args)?);
    }
    ctx.alloc_list(out)
}

/// (filter pred coll)
pub(crate) fn builtin_filter(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("filter", 2, args.len()));
    }
    let items = seq_values(ctx, "filter", 1, args[1])?;
    let mut out = Vector::new();
    for item in items {
        if caller.call(ctx, args[0], &[item])?.is_truthy() {
            out.push_back(item);
        }
    }
    ctx.alloc_list(out)
}

/// (reduce f coll) or (reduce f init coll)
pub(crate) fn builtin_reduce(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let f = args.first().copied();
    let (f, mut acc, items) = match (f, args.len()) {
        (Some(f), 2) => {
            let mut items = seq_values(ctx, "reduce", 1, args[1])?;
            match items.pop_front() {
                Some(first) => (f, first, items),
                None => return caller.call(ctx, f, &[]),
            }
        }
        (Some(f), 3) => (f, args[1], seq_values(ctx, "reduce", 2, args[2])?),
        (_, n) => return Err(Error::arity_range("reduce", 2, 3, n)),
    };
    for item in items {
        acc = caller.call(ctx, f, &[acc, item])?;
    }
    Ok(acc)
}
