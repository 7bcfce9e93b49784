// cinder-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type conversion between Rust and Cinder values.
//!
//! Cinder values that live on the heap are only meaningful together with
//! their [`Context`], so both traits take it: [`IntoValue`] allocates,
//! [`FromValue`] reads.
//!
//! # Built-in Conversions
//!
//! | Rust Type | Cinder Type |
//! |-----------|-------------|
//! | `()` | `nil` |
//! | `bool` | boolean |
//! | `i32`, `i64`, `usize` | integer |
//! | `f64` | float (integers widen when reading) |
//! | `char` | character |
//! | `String`, `&str` | string |
//! | [`Keyword`] | keyword |
//! | `Vec<T>` | vector (lists are accepted when reading) |
//! | `Option<T>` | `T` or `nil` |
//! | `HashMap<String, T>` | map with keyword keys |
//!
//! # Custom Conversions
//!
//! ```rust
//! use cinder_embed::{Context, Error, FromValue, IntoValue, Result, Value};
//!
//! struct Point { x: i64, y: i64 }
//!
//! impl IntoValue for Point {
//!     fn into_value(self, ctx: &mut Context) -> Result<Value> {
//!         ctx.vector_from([Value::Int(self.x), Value::Int(self.y)])
//!     }
//! }
//!
//! impl FromValue for Point {
//!     fn from_value(ctx: &Context, v: Value) -> Result<Self> {
//!         match <Vec<i64>>::from_value(ctx, v)?.as_slice() {
//!             [x, y] => Ok(Point { x: *x, y: *y }),
//!             _ => Err(Error::type_error_in("Point", "vector of 2 integers", v.type_name())),
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

use cinder_core::{Context, Error, Result, Value};

/// Convert a Rust value into a Cinder value owned by `ctx`.
pub trait IntoValue {
    fn into_value(self, ctx: &mut Context) -> Result<Value>;
}

/// Read a Rust value out of a Cinder value owned by `ctx`.
pub trait FromValue: Sized {
    fn from_value(ctx: &Context, v: Value) -> Result<Self>;
}

/// A keyword name, without the leading colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword(pub String);

fn mismatch(expected: &str, v: Value) -> Error {
    Error::type_error_in("Cannot convert value", expected, v.type_name())
}

// ============================================================================
// IntoValue implementations
// ============================================================================

impl IntoValue for Value {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(self)
    }
}

impl IntoValue for () {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Nil)
    }
}

impl IntoValue for bool {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Bool(self))
    }
}

impl IntoValue for i64 {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Int(self))
    }
}

impl IntoValue for i32 {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Int(i64::from(self)))
    }
}

impl IntoValue for usize {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        i64::try_from(self)
            .map(Value::Int)
            .map_err(|_| Error::arithmetic("Integer overflow"))
    }
}

impl IntoValue for f64 {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Float(self))
    }
}

impl IntoValue for char {
    fn into_value(self, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Char(self))
    }
}

impl IntoValue for &str {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        ctx.alloc_str(self)
    }
}

impl IntoValue for String {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        ctx.alloc_str(&self)
    }
}

impl IntoValue for Keyword {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        Ok(ctx.keyword(&self.0))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        match self {
            Some(v) => v.into_value(ctx),
            None => Ok(Value::Nil),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        // Elements are not rooted until the vector exists.
        ctx.inhibit_gc();
        let items: Result<Vec<Value>> = self.into_iter().map(|v| v.into_value(ctx)).collect();
        let result = items.and_then(|items| ctx.vector_from(items));
        ctx.allow_gc();
        result
    }
}

impl<T: IntoValue> IntoValue for HashMap<String, T> {
    fn into_value(self, ctx: &mut Context) -> Result<Value> {
        ctx.inhibit_gc();
        let entries: Result<Vec<(Value, Value)>> = self
            .into_iter()
            .map(|(k, v)| Ok((ctx.keyword(&k), v.into_value(ctx)?)))
            .collect();
        let result = entries.and_then(|entries| ctx.map_from(entries));
        ctx.allow_gc();
        result
    }
}

// ============================================================================
// FromValue implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        Ok(v)
    }
}

impl FromValue for () {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Nil => Ok(()),
            other => Err(mismatch("nil", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Int(n) => Ok(n),
            other => Err(mismatch("integer", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        let n = i64::from_value(ctx, v)?;
        i32::try_from(n).map_err(|_| Error::arithmetic(format!("{} does not fit in i32", n)))
    }
}

impl FromValue for usize {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        let n = i64::from_value(ctx, v)?;
        usize::try_from(n).map_err(|_| Error::arithmetic(format!("{} is not a valid size", n)))
    }
}

impl FromValue for f64 {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Float(n) => Ok(n),
            Value::Int(n) => Ok(n as f64),
            other => Err(mismatch("number", other)),
        }
    }
}

impl FromValue for char {
    fn from_value(_ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Char(c) => Ok(c),
            other => Err(mismatch("character", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        match ctx.str_of(v)? {
            Some(s) => Ok(s.to_string()),
            None => Err(mismatch("string", v)),
        }
    }
}

impl FromValue for Keyword {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Keyword(sym) => Ok(Keyword(ctx.sym_name(sym).to_string())),
            other => Err(mismatch("keyword", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Nil => Ok(None),
            other => T::from_value(ctx, other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        match v {
            Value::Nil => Ok(Vec::new()),
            _ => match ctx.seq_items(v)? {
                Some(items) => items.into_iter().map(|item| T::from_value(ctx, item)).collect(),
                None => Err(mismatch("vector or list", v)),
            },
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(ctx: &Context, v: Value) -> Result<Self> {
        let Some(map) = ctx.map_of(v)? else {
            return Err(mismatch("map", v));
        };
        map.iter()
            .map(|(k, val)| {
                let key = match k {
                    Value::Keyword(sym) | Value::Symbol(sym) => ctx.sym_name(sym).to_string(),
                    other => String::from_value(ctx, other)?,
                };
                Ok((key, T::from_value(ctx, val)?))
            })
            .collect()
    }
}

/// Convert a Rust value into a Cinder value.
pub fn to_value<T: IntoValue>(ctx: &mut Context, value: T) -> Result<Value> {
    value.into_value(ctx)
}

/// Convert a Cinder value into a Rust value.
pub fn from_value<T: FromValue>(ctx: &Context, value: Value) -> Result<T> {
    T::from_value(ctx, value)
}
