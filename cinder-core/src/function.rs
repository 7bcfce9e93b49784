// cinder-core - Function objects
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Function objects: interpreted closures, native functions and compiled
//! code units.
//!
//! Each backend creates the function kind it knows how to run. The tree-walk
//! backend builds [`Closure`]s over forms; the bytecode backend builds
//! [`FnBody::Compiled`] functions over its own [`CodeUnit`] type. Natives
//! are shared by both.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use cinder_reader::{Form, FormKind, SourceLoc};

use crate::backend::Caller;
use crate::context::Context;
use crate::env::Env;
use crate::error::{AritySpec, Result};
use crate::heap::Tracer;
use crate::interner::Sym;
use crate::value::Value;

/// Signature of a native (Rust) function.
pub type NativeFnPtr = fn(&mut Context, &mut dyn Caller, &[Value]) -> Result<Value>;

/// A native function that may capture state.
pub type NativeFn = Rc<dyn Fn(&mut Context, &mut dyn Caller, &[Value]) -> Result<Value>>;

/// A function value.
pub struct Function {
    pub name: Option<Sym>,
    pub is_macro: bool,
    pub body: FnBody,
}

#[derive(Clone)]
pub enum FnBody {
    /// A closure evaluated by walking its body forms.
    Interpreted(Rc<Closure>),
    /// A function implemented in Rust.
    Native(NativeFn),
    /// A function compiled to a backend-specific code unit.
    Compiled {
        unit: Rc<dyn CodeUnit>,
        captures: Rc<[Value]>,
    },
}

/// Compiled code owned by a backend. The core only needs to trace it and
/// hand it back to the backend that produced it.
pub trait CodeUnit {
    fn name(&self) -> Option<&str>;

    /// Push every value held by the unit (constants, nested units).
    fn trace(&self, tracer: &mut Tracer);

    /// Recover the backend's concrete unit type.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// A single arity of an interpreted function.
#[derive(Debug)]
pub struct FnArity {
    pub params: Vec<Sym>,
    pub rest: Option<Sym>,
    pub body: Rc<[Form]>,
    /// Embedded-object handles mentioned anywhere in `body`.
    pub embedded: Vec<u32>,
}

impl FnArity {
    pub fn new(params: Vec<Sym>, rest: Option<Sym>, body: Rc<[Form]>) -> Self {
        let mut embedded = Vec::new();
        collect_handles(&body, &mut embedded);
        FnArity {
            params,
            rest,
            body,
            embedded,
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        if self.rest.is_some() {
            argc >= self.params.len()
        } else {
            argc == self.params.len()
        }
    }
}

fn collect_handles(forms: &[Form], out: &mut Vec<u32>) {
    for form in forms {
        match &form.kind {
            FormKind::Opaque(handle) => out.push(*handle),
            _ => collect_handles(form.children(), out),
        }
    }
}

/// An interpreted closure: arities plus the environment it closes over.
#[derive(Debug)]
pub struct Closure {
    pub name: Option<Sym>,
    pub arities: Vec<FnArity>,
    pub env: Env,
    /// Location of the defining `fn` form.
    pub loc: SourceLoc,
}

impl Closure {
    /// Pick the arity for `argc` arguments: an exact fixed arity wins over a
    /// variadic one.
    pub fn select_arity(&self, argc: usize) -> Option<&FnArity> {
        self.arities
            .iter()
            .find(|a| a.rest.is_none() && a.params.len() == argc)
            .or_else(|| self.arities.iter().find(|a| a.accepts(argc)))
    }
}

/// Expected arity of a function with the given overloads, each described
/// as (fixed parameter count, has rest parameter).
pub fn arity_spec_of(overloads: impl IntoIterator<Item = (usize, bool)>) -> AritySpec {
    let mut min = usize::MAX;
    let mut max = 0;
    let mut variadic = false;
    for (fixed, rest) in overloads {
        min = min.min(fixed);
        max = max.max(fixed);
        variadic |= rest;
    }
    match (variadic, min == max) {
        _ if min == usize::MAX => AritySpec::Exact(0),
        (true, _) => AritySpec::AtLeast(min),
        (false, true) => AritySpec::Exact(min),
        (false, false) => AritySpec::Range(min, max),
    }
}

impl Closure {
    pub fn arity_spec(&self) -> AritySpec {
        arity_spec_of(self.arities.iter().map(|a| (a.params.len(), a.rest.is_some())))
    }
}

impl Function {
    pub fn native(name: Option<Sym>, f: NativeFn) -> Self {
        Function {
            name,
            is_macro: false,
            body: FnBody::Native(f),
        }
    }

    pub fn trace(&self, tracer: &mut Tracer) {
        match &self.body {
            FnBody::Interpreted(closure) => {
                tracer.env(&closure.env);
                for arity in &closure.arities {
                    for handle in &arity.embedded {
                        tracer.handle(*handle);
                    }
                }
            }
            FnBody::Native(_) => {}
            FnBody::Compiled { unit, captures } => {
                unit.trace(tracer);
                tracer.values(captures.iter().copied());
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.body {
            FnBody::Interpreted(_) => "interpreted",
            FnBody::Native(_) => "native",
            FnBody::Compiled { .. } => "compiled",
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("is_macro", &self.is_macro)
            .field("kind", &self.kind_name())
            .finish()
    }
}
