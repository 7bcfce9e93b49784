// cinder-core - Persistent collections
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Persistent list, vector, map and set payloads.
//!
//! All updates return a new collection and leave the receiver untouched;
//! structural sharing comes from the `im` crate. Maps and sets are keyed by
//! [`ValueKey`], a heap-independent projection of a value's contents, and
//! keep insertion order for printing and iteration.

use im::{HashMap, OrdMap, Vector};

use cinder_reader::SourceLoc;

use crate::error::Result;
use crate::heap::{Heap, HeapRef};
use crate::interner::Sym;
use crate::value::{Object, Value};

// ============================================================================
// Lists and vectors
// ============================================================================

/// Payload of a list or vector.
#[derive(Debug, Clone, Default)]
pub struct Seq {
    pub items: Vector<Value>,
    /// Source-location tag. Only set by the macro expander when converting
    /// a form to a value; ordinary construction leaves it unknown.
    pub loc: SourceLoc,
}

impl Seq {
    pub fn new(items: Vector<Value>) -> Self {
        Seq {
            items,
            loc: SourceLoc::UNKNOWN,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(values.into_iter().collect())
    }

    pub fn tagged(items: Vector<Value>, loc: SourceLoc) -> Self {
        Seq { items, loc }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Structural projection of a value used for hashing and equality.
///
/// Lists and vectors with equal elements project to the same key. Functions,
/// atoms and host objects compare by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Nil,
    Bool(bool),
    Int(i64),
    Float(u64),
    Char(char),
    Symbol(Sym),
    Keyword(Sym),
    Str(String),
    Seq(Vec<ValueKey>),
    /// Entries sorted by key, so maps with equal contents project equally.
    Map(Vec<(ValueKey, ValueKey)>),
    Set(Vec<ValueKey>),
    Ref(HeapRef),
}

impl ValueKey {
    pub fn of(heap: &Heap, v: Value) -> Result<ValueKey> {
        Ok(match v {
            Value::Nil => ValueKey::Nil,
            Value::Bool(b) => ValueKey::Bool(b),
            Value::Int(n) => ValueKey::Int(n),
            Value::Float(n) => {
                // -0.0 and 0.0 are equal
                let n = if n == 0.0 { 0.0 } else { n };
                ValueKey::Float(n.to_bits())
            }
            Value::Char(c) => ValueKey::Char(c),
            Value::Symbol(s) => ValueKey::Symbol(s),
            Value::Keyword(s) => ValueKey::Keyword(s),
            Value::Str(r) => match heap.get(r)? {
                Object::Str(s) => ValueKey::Str(s.to_string()),
                _ => ValueKey::Ref(r),
            },
            Value::List(r) | Value::Vector(r) => match heap.get(r)? {
                Object::List(seq) | Object::Vector(seq) => ValueKey::Seq(
                    seq.items
                        .iter()
                        .map(|v| ValueKey::of(heap, *v))
                        .collect::<Result<_>>()?,
                ),
                _ => ValueKey::Ref(r),
            },
            Value::Map(r) => match heap.get(r)? {
                Object::Map(map) => {
                    let mut entries = map
                        .iter()
                        .map(|(k, v)| Ok((ValueKey::of(heap, k)?, ValueKey::of(heap, v)?)))
                        .collect::<Result<Vec<_>>>()?;
                    entries.sort();
                    ValueKey::Map(entries)
                }
                _ => ValueKey::Ref(r),
            },
            Value::Set(r) => match heap.get(r)? {
                Object::Set(set) => {
                    let mut items = set
                        .iter()
                        .map(|v| ValueKey::of(heap, v))
                        .collect::<Result<Vec<_>>>()?;
                    items.sort();
                    ValueKey::Set(items)
                }
                _ => ValueKey::Ref(r),
            },
            Value::Fn(r) | Value::Atom(r) | Value::Host(r) => ValueKey::Ref(r),
        })
    }
}

// ============================================================================
// Maps
// ============================================================================

/// Persistent, insertion-ordered hash map.
#[derive(Debug, Clone, Default)]
pub struct PMap {
    entries: OrdMap<u64, (Value, Value)>,
    index: HashMap<ValueKey, u64>,
    next: u64,
}

impl PMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ValueKey) -> Option<Value> {
        self.index
            .get(key)
            .and_then(|seq| self.entries.get(seq))
            .map(|(_, v)| *v)
    }

    /// The stored key and value for `key`.
    pub fn entry(&self, key: &ValueKey) -> Option<(Value, Value)> {
        self.index
            .get(key)
            .and_then(|seq| self.entries.get(seq))
            .copied()
    }

    pub fn contains(&self, key: &ValueKey) -> bool {
        self.index.contains_key(key)
    }

    /// A new map with `k` bound to `v`. An existing key keeps its position.
    #[must_use]
    pub fn assoc(&self, key: ValueKey, k: Value, v: Value) -> PMap {
        let mut out = self.clone();
        match out.index.get(&key) {
            Some(&seq) => {
                out.entries.insert(seq, (k, v));
            }
            None => {
                out.entries.insert(out.next, (k, v));
                out.index.insert(key, out.next);
                out.next += 1;
            }
        }
        out
    }

    #[must_use]
    pub fn dissoc(&self, key: &ValueKey) -> PMap {
        let mut out = self.clone();
        if let Some(seq) = out.index.remove(key) {
            out.entries.remove(&seq);
        }
        out
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries.values().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.values().map(|(k, _)| *k)
    }

    pub fn vals(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.values().map(|(_, v)| *v)
    }
}

// ============================================================================
// Sets
// ============================================================================

/// Persistent, insertion-ordered hash set.
#[derive(Debug, Clone, Default)]
pub struct PSet {
    entries: OrdMap<u64, Value>,
    index: HashMap<ValueKey, u64>,
    next: u64,
}

impl PSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ValueKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &ValueKey) -> Option<Value> {
        self.index
            .get(key)
            .and_then(|seq| self.entries.get(seq))
            .copied()
    }

    #[must_use]
    pub fn conj(&self, key: ValueKey, v: Value) -> PSet {
        if self.index.contains_key(&key) {
            return self.clone();
        }
        let mut out = self.clone();
        out.entries.insert(out.next, v);
        out.index.insert(key, out.next);
        out.next += 1;
        out
    }

    #[must_use]
    pub fn disj(&self, key: &ValueKey) -> PSet {
        let mut out = self.clone();
        if let Some(seq) = out.index.remove(key) {
            out.entries.remove(&seq);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.values().copied()
    }
}
