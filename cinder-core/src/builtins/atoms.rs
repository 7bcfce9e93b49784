// cinder-core - Atom built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Atom operations: atom, deref, reset!, swap!, compare-and-set!
//!
//! An atom is a heap cell; its current value is reachable (and traced)
//! through the cell for as long as the atom itself is.

use crate::backend::Caller;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::heap::HeapRef;
use crate::value::{Object, Value};

use super::arg_type_error;

fn atom_ref(ctx: &Context, name: &str, v: Value) -> Result<HeapRef> {
    match v {
        Value::Atom(r) => Ok(r),
        other => Err(arg_type_error(ctx, name, 0, "atom", other)),
    }
}

fn read(ctx: &Context, r: HeapRef) -> Result<Value> {
    match ctx.heap.get(r)? {
        Object::Atom(v) => Ok(*v),
        other => Err(Error::internal(format!(
            "atom reference points at {}",
            other.kind_name()
        ))),
    }
}

fn write(ctx: &mut Context, r: HeapRef, v: Value) -> Result<()> {
    match ctx.heap.get_mut(r)? {
        Object::Atom(slot) => {
            *slot = v;
            Ok(())
        }
        other => Err(Error::internal(format!(
            "atom reference points at {}",
            other.kind_name()
        ))),
    }
}

// ============================================================================
// Creation and reading
// ============================================================================

/// (atom x)
pub(crate) fn builtin_atom(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("atom", 1, args.len()));
    }
    ctx.alloc_atom(args[0])
}

/// (deref atom), also written @atom
pub(crate) fn builtin_deref(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("deref", 1, args.len()));
    }
    let r = atom_ref(ctx, "deref", args[0])?;
    read(ctx, r)
}

// ============================================================================
// Updates
// ============================================================================

/// (reset! atom newval) - returns newval
pub(crate) fn builtin_reset(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("reset!", 2, args.len()));
    }
    let r = atom_ref(ctx, "reset!", args[0])?;
    write(ctx, r, args[1])?;
    Ok(args[1])
}

/// (swap! atom f & args) - sets the atom to (apply f current args)
pub(crate) fn builtin_swap(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("swap!", 2, args.len()));
    }
    let r = atom_ref(ctx, "swap!", args[0])?;
    let mut call_args = Vec::with_capacity(args.len() - 1);
    call_args.push(read(ctx, r)?);
    call_args.extend_from_slice(&args[2..]);
    let new_value = caller.call(ctx, args[1], &call_args)?;
    write(ctx, r, new_value)?;
    Ok(new_value)
}

/// (compare-and-set! atom oldval newval) - true if the swap happened
pub(crate) fn builtin_compare_and_set(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 3 {
        return Err(Error::arity_named("compare-and-set!", 3, args.len()));
    }
    let r = atom_ref(ctx, "compare-and-set!", args[0])?;
    if read(ctx, r)?.identical(args[1]) {
        write(ctx, r, args[2])?;
        return Ok(Value::TRUE);
    }
    Ok(Value::FALSE)
}
