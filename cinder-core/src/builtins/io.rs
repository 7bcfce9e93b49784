// cinder-core - I/O built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printing: str, pr-str, print, println, prn
//!
//! Output goes to the context's output sink (stdout unless captured).

use crate::backend::Caller;
use crate::context::Context;
use crate::error::Result;
use crate::value::Value;

fn join(ctx: &Context, args: &[Value], readably: bool) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|a| if readably { ctx.repr(*a) } else { ctx.display(*a) })
        .collect();
    parts.join(" ")
}

/// (str & args) - concatenate args as strings; nil contributes nothing
pub(crate) fn builtin_str(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let mut result = String::new();
    for arg in args {
        if !arg.is_nil() {
            result.push_str(&ctx.display(*arg));
        }
    }
    ctx.alloc_str(&result)
}

/// (pr-str & args) - readable representation, space separated
pub(crate) fn builtin_pr_str(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let text = join(ctx, args, true);
    ctx.alloc_str(&text)
}

/// (print & args) - print args without newline
pub(crate) fn builtin_print(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let text = join(ctx, args, false);
    ctx.write_output(&text);
    Ok(Value::Nil)
}

/// (println & args) - print args with newline
pub(crate) fn builtin_println(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    let mut text = join(ctx, args, false);
    text.push('\n');
    ctx.write_output(&text);
    Ok(Value::Nil)
}

/// (prn & args) - readable representation with newline
pub(crate) fn builtin_prn(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    let mut text = join(ctx, args, true);
    text.push('\n');
    ctx.write_output(&text);
    Ok(Value::Nil)
}
