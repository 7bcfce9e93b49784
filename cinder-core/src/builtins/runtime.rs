// cinder-core - Runtime built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! gensym, heap-stats, macroexpand-1, macroexpand

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::expander::{form_to_value, macroexpand_1, value_to_form};
use crate::value::Value;

use super::arg_type_error;

/// (gensym) or (gensym prefix)
pub(crate) fn builtin_gensym(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let prefix = match args {
        [] => "G__".to_string(),
        [p @ (Value::Str(_) | Value::Symbol(_))] => ctx.display(*p),
        [other] => return Err(arg_type_error(ctx, "gensym", 0, "string", *other)),
        _ => return Err(Error::arity_range("gensym", 0, 1, args.len())),
    };
    let name = ctx.gensym(&prefix);
    Ok(ctx.symbol(&name))
}

/// (heap-stats) - allocation counters as a map
pub(crate) fn builtin_heap_stats(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_named("heap-stats", 0, args.len()));
    }
    let stats = ctx.heap_stats();
    let entries = [
        (ctx.keyword("allocated"), Value::Int(stats.allocated as i64)),
        (ctx.keyword("freed"), Value::Int(stats.freed as i64)),
        (ctx.keyword("live"), Value::Int(stats.live as i64)),
        (ctx.keyword("collections"), Value::Int(stats.collections as i64)),
    ];
    ctx.map_from(entries)
}

/// (macroexpand-1 form) - expand the head macro once
pub(crate) fn builtin_macroexpand_1(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("macroexpand-1", 1, args.len()));
    }
    let form = value_to_form(ctx, args[0])?;
    match macroexpand_1(ctx, caller, &form)? {
        Some(expanded) => form_to_value(ctx, &expanded),
        None => Ok(args[0]),
    }
}

/// (macroexpand form) - expand the head macro until it is not a macro call
pub(crate) fn builtin_macroexpand(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("macroexpand", 1, args.len()));
    }
    let mut form = value_to_form(ctx, args[0])?;
    let mut expanded_any = false;
    for _ in 0..ctx.config.max_macro_depth {
        match macroexpand_1(ctx, caller, &form)? {
            Some(next) => {
                form = next;
                expanded_any = true;
            }
            None => break,
        }
    }
    if !expanded_any {
        return Ok(args[0]);
    }
    form_to_value(ctx, &form)
}
