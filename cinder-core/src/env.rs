// cinder-core - Environment for lexical scoping
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Environment for variable bindings with lexical scoping.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interner::Sym;
use crate::value::Value;

/// A lexical environment for variable bindings.
///
/// Environments form a chain through parent references. Lookup walks up
/// the chain; the root of the chain holds global definitions. Each
/// evaluation context owns exactly one root.
///
/// Environments are not heap objects. The collector reaches the values they
/// bind through the context root and through the closures that capture them.
#[derive(Debug, Clone)]
pub struct Env {
    inner: Rc<RefCell<EnvInner>>,
}

#[derive(Debug)]
struct EnvInner {
    bindings: HashMap<Sym, Value>,
    parent: Option<Env>,
}

impl Env {
    /// Create a new root environment with no parent.
    pub fn new() -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: None,
            })),
        }
    }

    /// Create a child environment with this environment as parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Define a binding in this environment (not parent).
    pub fn define(&self, sym: Sym, val: Value) {
        self.inner.borrow_mut().bindings.insert(sym, val);
    }

    /// Look up a symbol in this environment or parent chain.
    /// Uses iterative traversal to avoid stack overflow on deep environments.
    pub fn lookup(&self, sym: Sym) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let inner = current.inner.borrow();
            if let Some(val) = inner.bindings.get(&sym) {
                return Some(*val);
            }
            let parent = inner.parent.clone();
            drop(inner);
            match parent {
                Some(p) => current = p,
                None => return None,
            }
        }
    }

    /// Check if a symbol is bound in this environment only.
    pub fn contains_local(&self, sym: Sym) -> bool {
        self.inner.borrow().bindings.contains_key(&sym)
    }

    pub fn parent(&self) -> Option<Env> {
        self.inner.borrow().parent.clone()
    }

    pub fn is_root(&self) -> bool {
        self.inner.borrow().parent.is_none()
    }

    /// Number of bindings in this environment only.
    pub fn len(&self) -> usize {
        self.inner.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every value bound directly in this environment.
    pub fn for_each_value(&self, mut f: impl FnMut(Value)) {
        for v in self.inner.borrow().bindings.values() {
            f(*v);
        }
    }

    /// Identity of the underlying frame, for visited-sets.
    pub fn ptr_key(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
