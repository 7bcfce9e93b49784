// cinder-core - Evaluation context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The evaluation context: everything one evaluation session owns.
//!
//! A [`Context`] holds the heap, the interner, the root environment, the
//! argument attribution table and the configuration. Nothing here is global
//! or thread-local; independent contexts can run on separate threads.
//!
//! Values returned from evaluation stay valid until the next collection.
//! A collection only runs at a safe point inside a later evaluation, so a
//! host that wants to keep a value across evaluations must [`pin`] it or
//! bind it in the root environment.
//!
//! [`pin`]: Context::pin

use std::collections::HashMap;
use std::rc::Rc;

use im::Vector;

use crate::attribution::SourceTable;
use crate::backend::Caller;
use crate::collections::{PMap, PSet, Seq, ValueKey};
use crate::config::EvalConfig;
use crate::env::Env;
use crate::equality;
use crate::error::{Error, ErrorKind, Result};
use crate::function::{Function, NativeFn, NativeFnPtr};
use crate::heap::{Heap, HeapRef, HeapStats, Tracer};
use crate::interner::{Interner, Sym};
use crate::printer;
use crate::value::{HostObject, Object, Value};

/// Where `println` and friends write.
#[derive(Debug)]
pub enum Output {
    Stdout,
    Buffer(String),
}

/// Handle for a value pinned as a collector root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(u64);

pub struct Context {
    pub heap: Heap,
    pub interner: Interner,
    pub sources: SourceTable,
    pub config: EvalConfig,
    root: Env,
    pinned: HashMap<PinId, Value>,
    next_pin: u64,
    gensym_counter: u64,
    gc_inhibit: u32,
    call_depth: usize,
    top_level_depth: u32,
    output: Output,
    terminated: bool,
}

impl Context {
    pub fn new(config: EvalConfig) -> Self {
        Context {
            heap: Heap::new(config.max_heap_objects),
            interner: Interner::new(),
            sources: SourceTable::new(),
            config,
            root: Env::new(),
            pinned: HashMap::new(),
            next_pin: 0,
            gensym_counter: 0,
            gc_inhibit: 0,
            call_depth: 0,
            top_level_depth: 0,
            output: Output::Stdout,
            terminated: false,
        }
    }

    pub fn root_env(&self) -> &Env {
        &self.root
    }

    // ========================================================================
    // Names
    // ========================================================================

    pub fn intern(&mut self, name: &str) -> Sym {
        self.interner.intern(name)
    }

    pub fn sym_name(&self, sym: Sym) -> &str {
        self.interner.name(sym)
    }

    pub fn symbol(&mut self, name: &str) -> Value {
        Value::Symbol(self.intern(name))
    }

    pub fn keyword(&mut self, name: &str) -> Value {
        Value::Keyword(self.intern(name))
    }

    /// A fresh symbol name with the given prefix.
    pub fn gensym(&mut self, prefix: &str) -> String {
        self.gensym_counter += 1;
        format!("{}{}", prefix, self.gensym_counter)
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate a heap object. Heap exhaustion terminates the context.
    pub fn alloc(&mut self, object: Object) -> Result<HeapRef> {
        self.check_alive()?;
        self.heap.alloc(object).inspect_err(|e| {
            if e.kind == ErrorKind::HeapExhausted {
                log::warn!("heap exhausted; terminating evaluation context");
                self.terminated = true;
            }
        })
    }

    pub fn alloc_str(&mut self, s: &str) -> Result<Value> {
        Ok(Value::Str(self.alloc(Object::Str(Rc::from(s)))?))
    }

    pub fn alloc_list(&mut self, items: Vector<Value>) -> Result<Value> {
        Ok(Value::List(self.alloc(Object::List(Seq::new(items)))?))
    }

    pub fn list_from(&mut self, items: impl IntoIterator<Item = Value>) -> Result<Value> {
        self.alloc_list(items.into_iter().collect())
    }

    pub fn alloc_vector(&mut self, items: Vector<Value>) -> Result<Value> {
        Ok(Value::Vector(self.alloc(Object::Vector(Seq::new(items)))?))
    }

    pub fn vector_from(&mut self, items: impl IntoIterator<Item = Value>) -> Result<Value> {
        self.alloc_vector(items.into_iter().collect())
    }

    pub fn alloc_map(&mut self, map: PMap) -> Result<Value> {
        Ok(Value::Map(self.alloc(Object::Map(map))?))
    }

    /// Build a map from key/value pairs; later keys win.
    pub fn map_from(&mut self, pairs: impl IntoIterator<Item = (Value, Value)>) -> Result<Value> {
        let mut map = PMap::new();
        for (k, v) in pairs {
            let key = self.key(k)?;
            map = map.assoc(key, k, v);
        }
        self.alloc_map(map)
    }

    pub fn alloc_set(&mut self, set: PSet) -> Result<Value> {
        Ok(Value::Set(self.alloc(Object::Set(set))?))
    }

    pub fn set_from(&mut self, items: impl IntoIterator<Item = Value>) -> Result<Value> {
        let mut set = PSet::new();
        for v in items {
            let key = self.key(v)?;
            set = set.conj(key, v);
        }
        self.alloc_set(set)
    }

    pub fn alloc_atom(&mut self, v: Value) -> Result<Value> {
        Ok(Value::Atom(self.alloc(Object::Atom(v))?))
    }

    pub fn alloc_fn(&mut self, f: Function) -> Result<Value> {
        Ok(Value::Fn(self.alloc(Object::Fn(f))?))
    }

    pub fn alloc_host(&mut self, host: HostObject) -> Result<Value> {
        Ok(Value::Host(self.alloc(Object::Host(host))?))
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn object(&self, v: Value) -> Result<&Object> {
        match v.heap_ref() {
            Some(r) => self.heap.get(r),
            None => Err(Error::internal(format!(
                "{} is not a heap value",
                v.type_name()
            ))),
        }
    }

    /// The contents of a string value.
    pub fn str_of(&self, v: Value) -> Result<Option<Rc<str>>> {
        match v {
            Value::Str(r) => match self.heap.get(r)? {
                Object::Str(s) => Ok(Some(s.clone())),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// Elements of a list or vector.
    pub fn seq_items(&self, v: Value) -> Result<Option<Vector<Value>>> {
        match v {
            Value::List(r) | Value::Vector(r) => match self.heap.get(r)? {
                Object::List(seq) | Object::Vector(seq) => Ok(Some(seq.items.clone())),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// The payload of a list or vector, including its location tag.
    pub fn seq_of(&self, v: Value) -> Result<Option<&Seq>> {
        match v {
            Value::List(r) | Value::Vector(r) => match self.heap.get(r)? {
                Object::List(seq) | Object::Vector(seq) => Ok(Some(seq)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn map_of(&self, v: Value) -> Result<Option<PMap>> {
        match v {
            Value::Map(r) => match self.heap.get(r)? {
                Object::Map(map) => Ok(Some(map.clone())),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn set_of(&self, v: Value) -> Result<Option<PSet>> {
        match v {
            Value::Set(r) => match self.heap.get(r)? {
                Object::Set(set) => Ok(Some(set.clone())),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn function(&self, v: Value) -> Result<Option<&Function>> {
        match v {
            Value::Fn(r) => match self.heap.get(r)? {
                Object::Fn(f) => Ok(Some(f)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn is_macro(&self, v: Value) -> bool {
        matches!(self.function(v), Ok(Some(f)) if f.is_macro)
    }

    pub fn host_of(&self, v: Value) -> Result<Option<&HostObject>> {
        match v {
            Value::Host(r) => match self.heap.get(r)? {
                Object::Host(h) => Ok(Some(h)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn key(&self, v: Value) -> Result<ValueKey> {
        ValueKey::of(&self.heap, v)
    }

    pub fn values_equal(&self, a: Value, b: Value) -> Result<bool> {
        equality::values_equal(self, a, b)
    }

    /// Printed form, as `str` would produce it.
    pub fn display(&self, v: Value) -> String {
        printer::print_value(self, v, false)
    }

    /// Readable printed form, as `pr-str` would produce it.
    pub fn repr(&self, v: Value) -> String {
        printer::print_value(self, v, true)
    }

    // ========================================================================
    // Globals
    // ========================================================================

    pub fn define_global(&mut self, name: &str, v: Value) {
        let sym = self.intern(name);
        self.root.define(sym, v);
    }

    pub fn lookup_global(&self, sym: Sym) -> Option<Value> {
        self.root.lookup(sym)
    }

    /// Register a Rust function under `name`.
    pub fn define_native(&mut self, name: &str, f: NativeFnPtr) -> Result<()> {
        self.define_native_fn(name, Rc::new(f))
    }

    pub fn define_native_fn(&mut self, name: &str, f: NativeFn) -> Result<()> {
        let sym = self.intern(name);
        let value = self.alloc_fn(Function::native(Some(sym), f))?;
        self.root.define(sym, value);
        Ok(())
    }

    // ========================================================================
    // Invocation support
    // ========================================================================

    /// Run a native with the collector inhibited. The backend must have set
    /// up the attribution table; errors without a location get the call site.
    pub fn call_native(
        &mut self,
        caller: &mut dyn Caller,
        f: &NativeFn,
        args: &[Value],
    ) -> Result<Value> {
        self.gc_inhibit += 1;
        let result = f(self, caller, args);
        self.gc_inhibit -= 1;
        let site = self.sources.call_site();
        result.map_err(|e| e.or_at(site))
    }

    /// Attribute `err` to argument `index` of the current invocation.
    pub fn arg_error(&self, index: usize, err: Error) -> Error {
        err.or_at(self.sources.lookup(index))
    }

    /// Enter a closure or compiled-function call.
    pub fn enter_call(&mut self) -> Result<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::stack_overflow(self.config.max_call_depth));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Restore the call depth after unwinding to a known frame.
    pub fn set_call_depth(&mut self, depth: usize) {
        self.call_depth = depth;
    }

    // ========================================================================
    // Collection
    // ========================================================================

    pub fn inhibit_gc(&mut self) {
        self.gc_inhibit += 1;
    }

    pub fn allow_gc(&mut self) {
        self.gc_inhibit = self.gc_inhibit.saturating_sub(1);
    }

    pub fn gc_inhibited(&self) -> bool {
        self.gc_inhibit > 0
    }

    /// Collect now. `extra` pushes roots the context cannot see (a VM's
    /// operand stack, for instance).
    pub fn collect_garbage(&mut self, extra: &mut dyn FnMut(&mut Tracer)) -> usize {
        let root = &self.root;
        let pinned = &self.pinned;
        self.heap.collect(|tracer| {
            tracer.env(root);
            tracer.values(pinned.values().copied());
            extra(tracer);
        })
    }

    /// Collect if this is a permitted safe point and the allocation
    /// threshold (or stress mode) calls for it.
    pub fn maybe_collect(&mut self, extra: &mut dyn FnMut(&mut Tracer)) -> bool {
        if self.gc_inhibit > 0 || self.terminated {
            return false;
        }
        if self.config.stress_gc || self.heap.allocations_since_collect() >= self.config.gc_threshold
        {
            self.collect_garbage(extra);
            return true;
        }
        false
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Keep `v` alive across collections until unpinned.
    pub fn pin(&mut self, v: Value) -> PinId {
        let id = PinId(self.next_pin);
        self.next_pin += 1;
        self.pinned.insert(id, v);
        id
    }

    pub fn unpin(&mut self, id: PinId) -> Option<Value> {
        self.pinned.remove(&id)
    }

    pub fn pinned(&self, id: PinId) -> Option<Value> {
        self.pinned.get(&id).copied()
    }

    /// Register a runtime value for embedding in a form. The value stays
    /// alive for the rest of the current top-level evaluation and afterwards
    /// only while a live closure body mentions the handle.
    pub fn embed(&mut self, v: Value) -> u32 {
        self.heap.embed(v)
    }

    pub fn embedded(&self, handle: u32) -> Option<Value> {
        self.heap.embedded(handle)
    }

    /// Enter a top-level evaluation. Nested entries (the forms of a
    /// top-level `do`) share the outermost one's embedding scope.
    pub fn begin_top_level(&mut self) {
        if self.top_level_depth == 0 {
            self.heap.begin_embed_scope();
        }
        self.top_level_depth += 1;
    }

    pub fn end_top_level(&mut self) {
        self.top_level_depth = self.top_level_depth.saturating_sub(1);
        if self.top_level_depth == 0 {
            self.heap.end_embed_scope();
        }
    }

    // ========================================================================
    // Lifecycle and output
    // ========================================================================

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn check_alive(&self) -> Result<()> {
        if self.terminated {
            return Err(Error::new(
                ErrorKind::HeapExhausted,
                "Evaluation context terminated after heap exhaustion",
            ));
        }
        Ok(())
    }

    pub fn write_output(&mut self, text: &str) {
        match &mut self.output {
            Output::Stdout => print!("{}", text),
            Output::Buffer(buf) => buf.push_str(text),
        }
    }

    /// Send output to an in-memory buffer instead of stdout.
    pub fn capture_output(&mut self) {
        self.output = Output::Buffer(String::new());
    }

    /// Take buffered output. Empty when writing to stdout.
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Output::Buffer(buf) => std::mem::take(buf),
            Output::Stdout => String::new(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_values_survive_collection() {
        let mut ctx = Context::default();
        let kept = ctx.alloc_str("kept").unwrap();
        let dropped = ctx.alloc_str("dropped").unwrap();
        let pin = ctx.pin(kept);

        ctx.collect_garbage(&mut |_| {});
        assert_eq!(ctx.str_of(kept).unwrap().as_deref(), Some("kept"));
        assert!(ctx.str_of(dropped).is_err());

        ctx.unpin(pin);
        ctx.collect_garbage(&mut |_| {});
        assert!(ctx.str_of(kept).is_err());
    }

    #[test]
    fn globals_are_roots() {
        let mut ctx = Context::default();
        let v = ctx.list_from([Value::Int(1), Value::Int(2)]).unwrap();
        ctx.define_global("xs", v);
        ctx.collect_garbage(&mut |_| {});
        let items = ctx.seq_items(v).unwrap().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn exhaustion_terminates_context() {
        let mut ctx = Context::new(EvalConfig::default().with_max_heap_objects(1));
        ctx.alloc_str("a").unwrap();
        let err = ctx.alloc_str("b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::HeapExhausted);
        assert!(ctx.is_terminated());
        ctx.collect_garbage(&mut |_| {});
        assert!(ctx.alloc_str("c").is_err());
    }

    #[test]
    fn inhibited_context_skips_collection() {
        let mut ctx = Context::new(EvalConfig::default().with_stress_gc(true));
        ctx.alloc_str("garbage").unwrap();
        ctx.inhibit_gc();
        assert!(!ctx.maybe_collect(&mut |_| {}));
        ctx.allow_gc();
        assert!(ctx.maybe_collect(&mut |_| {}));
        assert_eq!(ctx.heap_stats().live, 0);
    }

    #[test]
    fn captured_output() {
        let mut ctx = Context::default();
        ctx.capture_output();
        ctx.write_output("hello");
        assert_eq!(ctx.take_output(), "hello");
        assert_eq!(ctx.take_output(), "");
    }
}
