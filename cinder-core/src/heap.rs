// cinder-core - Heap and mark-and-sweep collector
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arena heap with a stop-the-world mark-and-sweep collector.
//!
//! Objects live in generation-tagged slots. A [`HeapRef`] names a slot and
//! the generation it was allocated in, so a reference that outlives its
//! object is detected instead of silently aliasing a newer one.
//!
//! The heap never decides when to collect. Callers run [`Heap::collect`] at
//! safe points, supplying every root through the [`Tracer`].
//!
//! The heap also owns the embedded-object table: runtime values a macro
//! spliced into a form, addressed by `FormKind::Opaque` handles. An entry
//! lives while a traced closure body mentions its handle, or while it was
//! registered during the top-level evaluation still in progress.

use std::collections::{HashMap, HashSet};

use crate::env::Env;
use crate::error::{Error, ErrorKind, Result};
use crate::value::{Object, Value};

/// A reference to a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapRef {
    index: u32,
    generation: u32,
}

impl HeapRef {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects allocated since the heap was created.
    pub allocated: u64,
    /// Objects reclaimed since the heap was created.
    pub freed: u64,
    /// Objects currently live.
    pub live: usize,
    /// Completed collection cycles.
    pub collections: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

#[derive(Debug)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    max_objects: usize,
    since_collect: usize,
    stats: HeapStats,
    embedded: HashMap<u32, Value>,
    next_handle: u32,
    /// Handles at or above this one belong to the evaluation in progress.
    embed_floor: Option<u32>,
}

impl Heap {
    pub fn new(max_objects: usize) -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            max_objects,
            since_collect: 0,
            stats: HeapStats::default(),
            embedded: HashMap::new(),
            next_handle: 0,
            embed_floor: None,
        }
    }

    /// Allocate an object. Fails with `HeapExhausted` once the live object
    /// cap is reached.
    pub fn alloc(&mut self, object: Object) -> Result<HeapRef> {
        if self.stats.live >= self.max_objects {
            return Err(Error::new(
                ErrorKind::HeapExhausted,
                format!("Heap exhausted: {} live objects", self.stats.live),
            ));
        }
        self.stats.allocated += 1;
        self.stats.live += 1;
        self.since_collect += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return Ok(HeapRef {
                index,
                generation: slot.generation,
            });
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        Ok(HeapRef {
            index,
            generation: 0,
        })
    }

    pub fn get(&self, r: HeapRef) -> Result<&Object> {
        match self.slots.get(r.index as usize) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == r.generation => Ok(object),
            _ => Err(dangling(r)),
        }
    }

    pub fn get_mut(&mut self, r: HeapRef) -> Result<&mut Object> {
        match self.slots.get_mut(r.index as usize) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == r.generation => Ok(object),
            _ => Err(dangling(r)),
        }
    }

    /// True if `r` still names a live object.
    pub fn is_live(&self, r: HeapRef) -> bool {
        self.get(r).is_ok()
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    pub fn allocations_since_collect(&self) -> usize {
        self.since_collect
    }

    pub fn set_max_objects(&mut self, max_objects: usize) {
        self.max_objects = max_objects;
    }

    /// Register `v` for embedding in a form. Handles are never reused, so a
    /// stale handle resolves to nothing rather than to another value.
    pub fn embed(&mut self, v: Value) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.embedded.insert(handle, v);
        handle
    }

    pub fn embedded(&self, handle: u32) -> Option<Value> {
        self.embedded.get(&handle).copied()
    }

    pub fn embedded_count(&self) -> usize {
        self.embedded.len()
    }

    /// Root every handle registered from now until [`Heap::end_embed_scope`].
    pub fn begin_embed_scope(&mut self) {
        self.embed_floor = Some(self.next_handle);
    }

    pub fn end_embed_scope(&mut self) {
        self.embed_floor = None;
    }

    /// Mark everything reachable from the roots pushed by `mark_roots`, then
    /// reclaim the rest. Returns the number of objects freed.
    pub fn collect(&mut self, mark_roots: impl FnOnce(&mut Tracer)) -> usize {
        let mut tracer = Tracer::new(self.slots.len());
        if let Some(floor) = self.embed_floor {
            for &handle in self.embedded.keys() {
                if handle >= floor {
                    tracer.handle(handle);
                }
            }
        }
        mark_roots(&mut tracer);
        let roots = tracer.worklist.len();

        loop {
            while let Some(r) = tracer.worklist.pop() {
                let index = r.index as usize;
                if tracer.marks.get(index).copied().unwrap_or(true) {
                    continue;
                }
                let Some(slot) = self.slots.get(index) else {
                    continue;
                };
                if slot.generation != r.generation {
                    continue;
                }
                let Some(object) = &slot.object else {
                    continue;
                };
                tracer.marks[index] = true;
                object.trace(&mut tracer);
            }
            let Some(handle) = tracer.handles.pop() else {
                break;
            };
            if let Some(v) = self.embedded.get(&handle) {
                tracer.value(*v);
            }
        }
        let marked_handles = &tracer.marked_handles;
        self.embedded.retain(|handle, _| marked_handles.contains(handle));

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_some() && !tracer.marks[index] {
                slot.object = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }

        self.stats.freed += freed as u64;
        self.stats.live -= freed;
        self.stats.collections += 1;
        self.since_collect = 0;
        log::debug!(
            "gc: {} roots, {} freed, {} live",
            roots,
            freed,
            self.stats.live
        );
        freed
    }
}

fn dangling(r: HeapRef) -> Error {
    Error::internal(format!(
        "dangling heap reference {}:{}",
        r.index, r.generation
    ))
}

/// Mark-phase worklist. Roots and traced objects push the values they hold.
pub struct Tracer {
    marks: Vec<bool>,
    worklist: Vec<HeapRef>,
    envs: HashSet<usize>,
    handles: Vec<u32>,
    marked_handles: HashSet<u32>,
}

impl Tracer {
    fn new(slot_count: usize) -> Self {
        Tracer {
            marks: vec![false; slot_count],
            worklist: Vec::new(),
            envs: HashSet::new(),
            handles: Vec::new(),
            marked_handles: HashSet::new(),
        }
    }

    /// Keep the embedded value behind `handle` alive.
    pub fn handle(&mut self, handle: u32) {
        if self.marked_handles.insert(handle) {
            self.handles.push(handle);
        }
    }

    #[inline]
    pub fn value(&mut self, v: Value) {
        if let Some(r) = v.heap_ref() {
            self.heap_ref(r);
        }
    }

    #[inline]
    pub fn heap_ref(&mut self, r: HeapRef) {
        if !self.marks.get(r.index as usize).copied().unwrap_or(true) {
            self.worklist.push(r);
        }
    }

    pub fn values(&mut self, values: impl IntoIterator<Item = Value>) {
        for v in values {
            self.value(v);
        }
    }

    /// Trace every binding in `env` and its ancestors. Each environment is
    /// visited at most once per cycle.
    pub fn env(&mut self, env: &Env) {
        let mut current = Some(env.clone());
        while let Some(env) = current {
            if !self.envs.insert(env.ptr_key()) {
                break;
            }
            env.for_each_value(|v| self.value(v));
            current = env.parent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Seq;

    fn string(s: &str) -> Object {
        Object::Str(s.into())
    }

    #[test]
    fn unreachable_objects_are_freed() {
        let mut heap = Heap::new(100);
        let keep = heap.alloc(string("keep")).unwrap();
        let drop = heap.alloc(string("drop")).unwrap();

        let freed = heap.collect(|t| t.value(Value::Str(keep)));
        assert_eq!(freed, 1);
        assert!(heap.is_live(keep));
        assert!(!heap.is_live(drop));
        assert_eq!(heap.stats().live, 1);
        assert_eq!(heap.stats().freed, 1);
        assert_eq!(heap.stats().collections, 1);
    }

    #[test]
    fn reachability_is_transitive() {
        let mut heap = Heap::new(100);
        let inner = heap.alloc(string("inner")).unwrap();
        let list = heap
            .alloc(Object::List(Seq::from_values([Value::Str(inner)])))
            .unwrap();
        heap.collect(|t| t.value(Value::List(list)));
        assert!(heap.is_live(inner));
        assert!(heap.is_live(list));
    }

    #[test]
    fn cycles_through_atoms_are_collected() {
        let mut heap = Heap::new(100);
        let a = heap.alloc(Object::Atom(Value::Nil)).unwrap();
        let b = heap.alloc(Object::Atom(Value::Atom(a))).unwrap();
        *heap.get_mut(a).unwrap() = Object::Atom(Value::Atom(b));
        assert_eq!(heap.collect(|_| {}), 2);
    }

    #[test]
    fn reused_slot_rejects_stale_reference() {
        let mut heap = Heap::new(100);
        let old = heap.alloc(string("old")).unwrap();
        heap.collect(|_| {});
        let new = heap.alloc(string("new")).unwrap();
        assert_eq!(old.index(), new.index());
        assert!(heap.get(old).is_err());
        assert!(heap.get(new).is_ok());
    }

    #[test]
    fn embedded_values_live_while_referenced() {
        let mut heap = Heap::new(100);
        let kept = heap.alloc(string("kept")).unwrap();
        let dropped = heap.alloc(string("dropped")).unwrap();
        let kept_handle = heap.embed(Value::Str(kept));
        let dropped_handle = heap.embed(Value::Str(dropped));

        heap.collect(|t| t.handle(kept_handle));
        assert!(heap.is_live(kept));
        assert!(!heap.is_live(dropped));
        assert_eq!(heap.embedded(kept_handle), Some(Value::Str(kept)));
        assert_eq!(heap.embedded(dropped_handle), None);
        assert_eq!(heap.embedded_count(), 1);
    }

    #[test]
    fn embed_scope_roots_new_handles() {
        let mut heap = Heap::new(100);
        let old = heap.alloc(string("old")).unwrap();
        heap.embed(Value::Str(old));
        heap.begin_embed_scope();
        let new = heap.alloc(string("new")).unwrap();
        let handle = heap.embed(Value::Str(new));

        heap.collect(|_| {});
        assert!(heap.is_live(new));
        assert!(!heap.is_live(old));

        heap.end_embed_scope();
        heap.collect(|_| {});
        assert!(!heap.is_live(new));
        assert_eq!(heap.embedded(handle), None);
    }

    #[test]
    fn cap_reports_heap_exhausted() {
        let mut heap = Heap::new(2);
        heap.alloc(string("a")).unwrap();
        heap.alloc(string("b")).unwrap();
        let err = heap.alloc(string("c")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HeapExhausted);
    }
}
