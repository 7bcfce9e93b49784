// cinder-core - Exception built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Exception operations: ex-info, ex-message, ex-data
//!
//! An exception info value is a plain map
//! `{:type :ex-info :message msg :data data}`; `throw` raises it as the
//! payload of a `UserRaised` error.

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;

use super::arg_type_error;

// ============================================================================
// Exceptions
// ============================================================================

/// (ex-info msg data) - create an exception info map
pub(crate) fn builtin_ex_info(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("ex-info", 2, args.len()));
    }
    if !matches!(args[0], Value::Str(_)) {
        return Err(arg_type_error(ctx, "ex-info", 0, "string", args[0]));
    }
    if !matches!(args[1], Value::Map(_) | Value::Nil) {
        return Err(arg_type_error(ctx, "ex-info", 1, "map", args[1]));
    }
    let entries = [
        (ctx.keyword("type"), ctx.keyword("ex-info")),
        (ctx.keyword("message"), args[0]),
        (ctx.keyword("data"), args[1]),
    ];
    ctx.map_from(entries)
}

fn field(ctx: &mut Context, name: &str, args: &[Value], key: &str) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named(name, 1, args.len()));
    }
    match args[0] {
        Value::Map(_) => {
            let key = ctx.keyword(key);
            let map = ctx.map_of(args[0])?.unwrap_or_default();
            Ok(map.get(&ctx.key(key)?).unwrap_or(Value::Nil))
        }
        _ => Ok(Value::Nil),
    }
}

/// (ex-message ex)
pub(crate) fn builtin_ex_message(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    field(ctx, "ex-message", args, "message")
}

/// (ex-data ex)
pub(crate) fn builtin_ex_data(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    field(ctx, "ex-data", args, "data")
}
