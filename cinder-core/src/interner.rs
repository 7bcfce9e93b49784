// cinder-core - Symbol and keyword interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Per-context interning of symbol and keyword names.
//!
//! Each evaluation context owns its interner; a [`Sym`] is only meaningful
//! to the interner that produced it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An interned name. Symbols and keywords share one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(u32);

impl Sym {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct Interner {
    names: Vec<Rc<str>>,
    lookup: HashMap<Rc<str>, Sym>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning the existing id if already present.
    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(&sym) = self.lookup.get(name) {
            return sym;
        }
        let sym = Sym(self.names.len() as u32);
        let name: Rc<str> = Rc::from(name);
        self.names.push(name.clone());
        self.lookup.insert(name, sym);
        sym
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Sym> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, sym: Sym) -> &str {
        self.names.get(sym.0 as usize).map(|s| &**s).unwrap_or("?")
    }

    /// Shared handle to the name, for keys that outlive a borrow.
    pub fn name_rc(&self, sym: Sym) -> Rc<str> {
        self.names
            .get(sym.0 as usize)
            .cloned()
            .unwrap_or_else(|| Rc::from("?"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
        assert_eq!(interner.intern("foo"), a);
        assert_eq!(interner.name(b), "bar");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn separate_interners_are_independent() {
        let mut first = Interner::new();
        let mut second = Interner::new();
        first.intern("only-here");
        assert_eq!(second.get("only-here"), None);
        let x = second.intern("x");
        assert_eq!(second.name(x), "x");
    }
}
