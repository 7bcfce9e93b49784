// cinder-core - Runtime values
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime values and the heap objects they refer to.
//!
//! [`Value`] is a small `Copy` tagged union. Immediates (nil, booleans,
//! numbers, characters, interned names) are stored inline; everything else
//! is a [`HeapRef`] into the owning context's [`Heap`](crate::heap::Heap).
//! A `Value` is only meaningful together with the context that produced it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::collections::{PMap, PSet, Seq};
use crate::function::Function;
use crate::heap::{HeapRef, Tracer};
use crate::interner::Sym;

/// A Cinder runtime value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Symbol(Sym),
    Keyword(Sym),
    Str(HeapRef),
    List(HeapRef),
    Vector(HeapRef),
    Map(HeapRef),
    Set(HeapRef),
    Fn(HeapRef),
    Atom(HeapRef),
    Host(HeapRef),
}

impl Value {
    pub const NIL: Value = Value::Nil;
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);

    /// Only `nil` and `false` are falsey.
    #[inline]
    pub fn is_truthy(self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    pub fn is_number(self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// The heap object this value refers to, if any.
    #[inline]
    pub fn heap_ref(self) -> Option<HeapRef> {
        match self {
            Value::Str(r)
            | Value::List(r)
            | Value::Vector(r)
            | Value::Map(r)
            | Value::Set(r)
            | Value::Fn(r)
            | Value::Atom(r)
            | Value::Host(r) => Some(r),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "character",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Fn(_) => "function",
            Value::Atom(_) => "atom",
            Value::Host(_) => "host object",
        }
    }

    /// Identity comparison: same immediate or same heap object.
    pub fn identical(self, other: Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) | (Value::Keyword(a), Value::Keyword(b)) => {
                a == b
            }
            (a, b) => match (a.heap_ref(), b.heap_ref()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

/// An opaque host handle, e.g. a reference to a loaded foreign module.
#[derive(Clone)]
pub struct HostObject {
    pub type_name: Rc<str>,
    pub data: Rc<dyn Any>,
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({})", self.type_name)
    }
}

/// A heap-allocated object.
#[derive(Debug)]
pub enum Object {
    Str(Rc<str>),
    List(Seq),
    Vector(Seq),
    Map(PMap),
    Set(PSet),
    Fn(Function),
    /// Mutable reference cell.
    Atom(Value),
    Host(HostObject),
}

impl Object {
    /// Push every value this object references.
    pub fn trace(&self, tracer: &mut Tracer) {
        match self {
            Object::Str(_) | Object::Host(_) => {}
            Object::List(seq) | Object::Vector(seq) => {
                for v in seq.items.iter() {
                    tracer.value(*v);
                }
            }
            Object::Map(map) => {
                for (k, v) in map.iter() {
                    tracer.value(k);
                    tracer.value(v);
                }
            }
            Object::Set(set) => {
                for v in set.iter() {
                    tracer.value(v);
                }
            }
            Object::Fn(f) => f.trace(tracer),
            Object::Atom(v) => tracer.value(*v),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Str(_) => "string",
            Object::List(_) => "list",
            Object::Vector(_) => "vector",
            Object::Map(_) => "map",
            Object::Set(_) => "set",
            Object::Fn(_) => "function",
            Object::Atom(_) => "atom",
            Object::Host(_) => "host object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::FALSE.is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::TRUE.is_truthy());
    }

    #[test]
    fn identity_of_immediates() {
        assert!(Value::Int(3).identical(Value::Int(3)));
        assert!(!Value::Int(3).identical(Value::Float(3.0)));
        assert!(Value::Float(f64::NAN).identical(Value::Float(f64::NAN)));
    }
}
