// cinder-core - Backend traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The seam between the shared pipeline and the two execution backends.

use cinder_reader::Form;

use crate::context::Context;
use crate::error::{Error, ErrorKind, Result};
use crate::function::{FnBody, NativeFn};
use crate::value::Value;

/// Anything that can invoke a function value.
///
/// Natives that call back into evaluated code (`apply`, `swap!`) and the
/// macro expander go through this trait, so the active backend runs the
/// callee.
pub trait Caller {
    fn call(&mut self, ctx: &mut Context, f: Value, args: &[Value]) -> Result<Value>;
}

/// An execution backend.
pub trait Backend: Caller {
    fn name(&self) -> &'static str;

    fn as_caller(&mut self) -> &mut dyn Caller;

    /// Evaluate one fully expanded and validated top-level form.
    fn eval_form(&mut self, ctx: &mut Context, form: &Form) -> Result<Value>;
}

/// Invoke a native from a callback (not from a call form).
///
/// There are no argument forms, so argument slots are cleared and errors
/// fall back to the enclosing call site. The caller's attribution table is
/// restored afterwards.
pub fn call_native_callback(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    native: &NativeFn,
    args: &[Value],
) -> Result<Value> {
    let saved = ctx.sources.snapshot();
    let site = ctx.sources.call_site();
    ctx.sources.begin_call(site);
    let result = ctx.call_native(caller, native, args);
    ctx.sources.restore(saved);
    result
}

/// Resolve `f` to its body for a call, or fail with "not callable".
pub fn callable_body(ctx: &Context, f: Value) -> Result<FnBody> {
    match f {
        Value::Fn(_) => match ctx.function(f)? {
            Some(func) => Ok(func.body.clone()),
            None => Err(Error::not_callable(f.type_name())),
        },
        other => Err(Error::not_callable(other.type_name())),
    }
}

// ============================================================================
// throw / catch
// ============================================================================

/// The error raised by `(throw payload)`. The message is the `:message` of
/// an exception-info map, or the printed payload.
pub fn user_raised(ctx: &Context, payload: Value) -> Error {
    let message = ctx
        .interner
        .get("message")
        .and_then(|sym| {
            let map = ctx.map_of(payload).ok()??;
            map.get(&ctx.key(Value::Keyword(sym)).ok()?)
        })
        .map(|m| ctx.display(m))
        .unwrap_or_else(|| ctx.repr(payload));
    Error::new(ErrorKind::UserRaised, message).with_payload(payload)
}

/// The value a `catch` clause binds for `err`: the thrown payload, or a
/// `{:type <kind> :message <text>}` map for errors raised by the runtime.
pub fn caught_value(ctx: &mut Context, err: &Error) -> Result<Value> {
    if let Some(payload) = err.payload {
        return Ok(payload);
    }
    let entries = [
        (ctx.keyword("type"), ctx.keyword(err.kind.keyword_name())),
        (ctx.keyword("message"), ctx.alloc_str(&err.message)?),
    ];
    ctx.map_from(entries)
}
