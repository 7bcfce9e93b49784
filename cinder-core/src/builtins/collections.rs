// cinder-core - Collection built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Collection operations: list, vector, hash-map, hash-set, conj, assoc,
//! dissoc, get, contains?, keys, vals. Also the lookup behaviour of
//! keywords, maps, sets and vectors used as functions.

use im::Vector;

use crate::backend::Caller;
use crate::collections::{PMap, PSet};
use crate::context::Context;
use crate::error::{AritySpec, Error, Result};
use crate::value::Value;

use super::arg_type_error;

// ============================================================================
// Constructors
// ============================================================================

/// (list & items)
pub(crate) fn builtin_list(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    ctx.list_from(args.iter().copied())
}

/// (vector & items)
pub(crate) fn builtin_vector(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    ctx.vector_from(args.iter().copied())
}

/// (hash-map & kvs)
pub(crate) fn builtin_hash_map(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(Error::type_error_in(
            "hash-map",
            "even number of arguments",
            "odd number",
        ));
    }
    ctx.map_from(args.chunks(2).map(|pair| (pair[0], pair[1])))
}

/// (hash-set & items)
pub(crate) fn builtin_hash_set(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    ctx.set_from(args.iter().copied())
}

// ============================================================================
// Lookup
// ============================================================================

/// Look `key` up in `coll`: map keys, set members, vector and string
/// indices. `None` when absent or when `coll` is not associative.
fn lookup(ctx: &Context, coll: Value, key: Value) -> Result<Option<Value>> {
    match coll {
        Value::Map(_) => match ctx.map_of(coll)? {
            Some(map) => Ok(map.get(&ctx.key(key)?)),
            None => Ok(None),
        },
        Value::Set(_) => match ctx.set_of(coll)? {
            Some(set) => Ok(set.get(&ctx.key(key)?)),
            None => Ok(None),
        },
        Value::Vector(_) => match key {
            Value::Int(i) if i >= 0 => {
                Ok(ctx.seq_items(coll)?.and_then(|items| items.get(i as usize).copied()))
            }
            _ => Ok(None),
        },
        Value::Str(_) => match key {
            Value::Int(i) if i >= 0 => Ok(ctx
                .str_of(coll)?
                .and_then(|s| s.chars().nth(i as usize))
                .map(Value::Char)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

/// (get coll key) or (get coll key not-found)
pub(crate) fn builtin_get(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("get", 2, 3, args.len()));
    }
    let default = args.get(2).copied().unwrap_or(Value::Nil);
    Ok(lookup(ctx, args[0], args[1])?.unwrap_or(default))
}

/// (contains? coll key) - key membership, not value membership
pub(crate) fn builtin_contains_p(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("contains?", 2, args.len()));
    }
    let (coll, key) = (args[0], args[1]);
    let found = match coll {
        Value::Nil => false,
        Value::Map(_) => ctx
            .map_of(coll)?
            .is_some_and(|map| ctx.key(key).is_ok_and(|k| map.contains(&k))),
        Value::Set(_) => ctx
            .set_of(coll)?
            .is_some_and(|set| ctx.key(key).is_ok_and(|k| set.contains(&k))),
        Value::Vector(_) => match key {
            Value::Int(i) => i >= 0 && (i as usize) < ctx.seq_items(coll)?.map_or(0, |v| v.len()),
            _ => false,
        },
        other => return Err(arg_type_error(ctx, "contains?", 0, "associative collection", other)),
    };
    Ok(Value::Bool(found))
}

/// (keys map) - nil for an empty map
pub(crate) fn builtin_keys(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    map_view(ctx, "keys", args, |map| map.keys().collect())
}

/// (vals map) - nil for an empty map
pub(crate) fn builtin_vals(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    map_view(ctx, "vals", args, |map| map.vals().collect())
}

fn map_view(
    ctx: &mut Context,
    name: &str,
    args: &[Value],
    view: fn(&PMap) -> Vector<Value>,
) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named(name, 1, args.len()));
    }
    let map = match args[0] {
        Value::Nil => return Ok(Value::Nil),
        Value::Map(_) => ctx.map_of(args[0])?.unwrap_or_default(),
        other => return Err(arg_type_error(ctx, name, 0, "map", other)),
    };
    if map.is_empty() {
        return Ok(Value::Nil);
    }
    ctx.alloc_list(view(&map))
}

// ============================================================================
// Updates
// ============================================================================

/// (conj coll & xs) - lists grow at the front, vectors at the back
pub(crate) fn builtin_conj(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return ctx.vector_from([]);
    }
    let coll = args[0];
    let xs = &args[1..];
    match coll {
        Value::Nil | Value::List(_) => {
            let mut items = ctx.seq_items(coll)?.unwrap_or_default();
            for x in xs {
                items.push_front(*x);
            }
            ctx.alloc_list(items)
        }
        Value::Vector(_) => {
            let mut items = ctx.seq_items(coll)?.unwrap_or_default();
            items.extend(xs.iter().copied());
            ctx.alloc_vector(items)
        }
        Value::Set(_) => {
            let mut set = ctx.set_of(coll)?.unwrap_or_default();
            for x in xs {
                set = set.conj(ctx.key(*x)?, *x);
            }
            ctx.alloc_set(set)
        }
        Value::Map(_) => {
            let mut map = ctx.map_of(coll)?.unwrap_or_default();
            for (i, x) in xs.iter().enumerate() {
                map = conj_entry(ctx, map, *x, i + 1)?;
            }
            ctx.alloc_map(map)
        }
        other => Err(arg_type_error(ctx, "conj", 0, "collection", other)),
    }
}

/// Add a `[k v]` pair, or every entry of another map, to `map`.
fn conj_entry(ctx: &Context, map: PMap, entry: Value, index: usize) -> Result<PMap> {
    match entry {
        Value::Vector(_) => match ctx.seq_items(entry)? {
            Some(pair) if pair.len() == 2 => Ok(map.assoc(ctx.key(pair[0])?, pair[0], pair[1])),
            _ => Err(arg_type_error(ctx, "conj", index, "map entry", entry)),
        },
        Value::Map(_) => {
            let mut map = map;
            for (k, v) in ctx.map_of(entry)?.unwrap_or_default().iter() {
                map = map.assoc(ctx.key(k)?, k, v);
            }
            Ok(map)
        }
        Value::Nil => Ok(map),
        other => Err(arg_type_error(ctx, "conj", index, "map entry", other)),
    }
}

/// (assoc coll k v & kvs) - maps by key, vectors by index (up to count)
pub(crate) fn builtin_assoc(ctx: &mut Context, _: &mut dyn Caller, args: &[Value]) -> Result<Value> {
    if args.len() < 3 || (args.len() - 1) % 2 != 0 {
        return Err(Error::arity_spec("assoc", AritySpec::AtLeast(3), args.len()));
    }
    let coll = args[0];
    match coll {
        Value::Nil | Value::Map(_) => {
            let mut map = ctx.map_of(coll)?.unwrap_or_default();
            for pair in args[1..].chunks(2) {
                map = map.assoc(ctx.key(pair[0])?, pair[0], pair[1]);
            }
            ctx.alloc_map(map)
        }
        Value::Vector(_) => {
            let mut items = ctx.seq_items(coll)?.unwrap_or_default();
            for (i, pair) in args[1..].chunks(2).enumerate() {
                let index_arg = 1 + 2 * i;
                let Value::Int(index) = pair[0] else {
                    return Err(arg_type_error(ctx, "assoc", index_arg, "integer", pair[0]));
                };
                if index < 0 || index as usize > items.len() {
                    return Err(
                        ctx.arg_error(index_arg, Error::index_out_of_bounds(index, items.len()))
                    );
                }
                if index as usize == items.len() {
                    items.push_back(pair[1]);
                } else {
                    items.set(index as usize, pair[1]);
                }
            }
            ctx.alloc_vector(items)
        }
        other => Err(arg_type_error(ctx, "assoc", 0, "map or vector", other)),
    }
}

/// (dissoc map & keys)
pub(crate) fn builtin_dissoc(
    ctx: &mut Context,
    _: &mut dyn Caller,
    args: &[Value],
) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least("dissoc", 1, 0));
    }
    match args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Map(_) => {
            let mut map = ctx.map_of(args[0])?.unwrap_or_default();
            for k in &args[1..] {
                map = map.dissoc(&ctx.key(*k)?);
            }
            ctx.alloc_map(map)
        }
        other => Err(arg_type_error(ctx, "dissoc", 0, "map", other)),
    }
}

// ============================================================================
// Collections as functions
// ============================================================================

/// Invoke a keyword, map, set or vector as a function. Anything else is
/// not callable.
pub fn call_data(ctx: &mut Context, f: Value, args: &[Value]) -> Result<Value> {
    match f {
        Value::Keyword(_) => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::arity_range(&ctx.display(f), 1, 2, args.len()));
            }
            let default = args.get(1).copied().unwrap_or(Value::Nil);
            Ok(lookup(ctx, args[0], f)?.unwrap_or(default))
        }
        Value::Map(_) => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::arity_range("map", 1, 2, args.len()));
            }
            let default = args.get(1).copied().unwrap_or(Value::Nil);
            Ok(lookup(ctx, f, args[0])?.unwrap_or(default))
        }
        Value::Set(_) => {
            if args.len() != 1 {
                return Err(Error::arity_named("set", 1, args.len()));
            }
            let set: PSet = ctx.set_of(f)?.unwrap_or_default();
            Ok(set.get(&ctx.key(args[0])?).unwrap_or(Value::Nil))
        }
        Value::Vector(_) => {
            if args.len() != 1 {
                return Err(Error::arity_named("vector", 1, args.len()));
            }
            let items = ctx.seq_items(f)?.unwrap_or_default();
            let Value::Int(index) = args[0] else {
                return Err(arg_type_error(ctx, "vector", 0, "integer", args[0]));
            };
            if index < 0 || index as usize >= items.len() {
                return Err(ctx.arg_error(0, Error::index_out_of_bounds(index, items.len())));
            }
            Ok(items[index as usize])
        }
        other => Err(Error::not_callable(other.type_name())),
    }
}
