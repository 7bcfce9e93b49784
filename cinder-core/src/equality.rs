// cinder-core - Structural equality
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Value equality as seen by `=`.
//!
//! Integers and floats never compare equal to each other. Lists and vectors
//! with equal elements are equal. Maps and sets compare by contents
//! regardless of insertion order. Functions, atoms and host objects compare
//! by identity.

use crate::context::Context;
use crate::error::Result;
use crate::value::{Object, Value};

pub fn values_equal(ctx: &Context, a: Value, b: Value) -> Result<bool> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::Char(x), Value::Char(y)) => Ok(x == y),
        (Value::Symbol(x), Value::Symbol(y)) | (Value::Keyword(x), Value::Keyword(y)) => Ok(x == y),
        (Value::Str(_), Value::Str(_)) => Ok(ctx.str_of(a)? == ctx.str_of(b)?),
        (Value::List(_) | Value::Vector(_), Value::List(_) | Value::Vector(_)) => {
            if a.identical(b) {
                return Ok(true);
            }
            let (Some(xs), Some(ys)) = (ctx.seq_items(a)?, ctx.seq_items(b)?) else {
                return Ok(false);
            };
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys.iter()) {
                if !values_equal(ctx, *x, *y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Map(_), Value::Map(_)) => {
            let (Some(xs), Some(ys)) = (ctx.map_of(a)?, ctx.map_of(b)?) else {
                return Ok(false);
            };
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (k, v) in xs.iter() {
                match ys.get(&ctx.key(k)?) {
                    Some(other) if values_equal(ctx, v, other)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Value::Set(_), Value::Set(_)) => {
            let (Some(xs), Some(ys)) = (ctx.set_of(a)?, ctx.set_of(b)?) else {
                return Ok(false);
            };
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for v in xs.iter() {
                if !ys.contains(&ctx.key(v)?) {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Fn(_), Value::Fn(_))
        | (Value::Atom(_), Value::Atom(_))
        | (Value::Host(_), Value::Host(_)) => Ok(a.identical(b)),
        _ => Ok(false),
    }
}

/// True if `v` is a list or vector.
pub fn is_sequential(ctx: &Context, v: Value) -> bool {
    matches!(
        ctx.object(v),
        Ok(Object::List(_)) | Ok(Object::Vector(_))
    )
}
