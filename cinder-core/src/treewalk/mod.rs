// cinder-core - Tree-walking backend
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Direct evaluation of expanded forms.
//!
//! The evaluator keeps a location cursor: the location of the innermost
//! enclosing form that has one. A form without a location (built by a
//! macro) is attributed to the cursor. The bytecode compiler tracks the
//! same cursor, which is what lets both backends report identical error
//! locations.
//!
//! Closure entry and every `recur` iteration are collector safe points.
//! Values the walker holds in Rust locals across a nested evaluation are
//! rooted explicitly: every scope it has entered sits on `scopes`, and
//! partially evaluated argument lists sit on `temps`. Evaluation grows the
//! host stack on demand, so deep recursion ends in `StackOverflow` at the
//! configured call depth rather than overflowing the native stack.

mod apply;
mod special_forms;

use cinder_reader::{Form, FormKind, SourceLoc};

use crate::analyze::is_special_form;
use crate::backend::{Backend, Caller};
use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::heap::Tracer;
use crate::value::Value;

/// Remaining stack below which evaluation moves to a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each additional stack segment.
const STACK_GROW: usize = 2 * 1024 * 1024;

/// Non-local exits while walking a body.
#[derive(Debug)]
pub(crate) enum Unwind {
    Error(Error),
    /// `(recur ...)` on its way to the enclosing loop or fn.
    Recur(Vec<Value>),
}

impl From<Error> for Unwind {
    fn from(err: Error) -> Self {
        Unwind::Error(err)
    }
}

pub(crate) type Flow<T> = std::result::Result<T, Unwind>;

/// Turn an unwind that escaped its target into an error.
pub(crate) fn into_error(unwind: Unwind) -> Error {
    match unwind {
        Unwind::Error(err) => err,
        Unwind::Recur(_) => Error::internal("recur escaped its loop"),
    }
}

/// The tree-walking backend.
#[derive(Debug, Default)]
pub struct TreeWalk {
    cursor: SourceLoc,
    /// Scopes entered by active evaluations, innermost last.
    scopes: Vec<Env>,
    /// Values evaluated but not yet bound anywhere the collector can see.
    temps: Vec<Value>,
}

impl TreeWalk {
    pub fn new() -> Self {
        Self::default()
    }

    fn eval(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW, || {
            let saved = self.cursor;
            self.cursor = form.loc.or(saved);
            let result = self.eval_inner(ctx, form, env);
            self.cursor = saved;
            result
        })
    }

    /// Run `f` with `scope` rooted.
    fn in_scope<T>(
        &mut self,
        ctx: &mut Context,
        scope: &Env,
        f: impl FnOnce(&mut Self, &mut Context) -> T,
    ) -> T {
        let mark = self.scopes.len();
        self.scopes.push(scope.clone());
        let result = f(self, ctx);
        self.scopes.truncate(mark);
        result
    }

    /// Run `f` with `values` rooted.
    fn holding<T>(
        &mut self,
        ctx: &mut Context,
        values: &[Value],
        f: impl FnOnce(&mut Self, &mut Context) -> T,
    ) -> T {
        let mark = self.temps.len();
        self.temps.extend_from_slice(values);
        let result = f(self, ctx);
        self.temps.truncate(mark);
        result
    }

    fn trace_roots(&self, tracer: &mut Tracer) {
        for scope in &self.scopes {
            tracer.env(scope);
        }
        tracer.values(self.temps.iter().copied());
    }

    /// Collect if the context allows it, rooting everything the walker holds.
    fn safe_point(&self, ctx: &mut Context) {
        if ctx.maybe_collect(&mut |tracer| self.trace_roots(tracer)) {
            log::trace!("collected at tree-walk safe point ({} scopes)", self.scopes.len());
        }
    }

    /// Evaluate a body, yielding the last value (nil when empty).
    fn eval_body(&mut self, ctx: &mut Context, body: &[Form], env: &Env) -> Flow<Value> {
        let mut result = Value::Nil;
        for form in body {
            result = self.eval(ctx, form, env)?;
        }
        Ok(result)
    }

    fn eval_inner(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        match &form.kind {
            FormKind::Nil => Ok(Value::Nil),
            FormKind::Bool(b) => Ok(Value::Bool(*b)),
            FormKind::Int(n) => Ok(Value::Int(*n)),
            FormKind::Float(n) => Ok(Value::Float(*n)),
            FormKind::Char(c) => Ok(Value::Char(*c)),
            FormKind::Str(s) => Ok(ctx.alloc_str(s)?),
            FormKind::Keyword(name) => Ok(ctx.keyword(name)),
            FormKind::Symbol(name) => Ok(self.resolve(ctx, name, env)?),
            FormKind::Opaque(handle) => Ok(ctx.embedded(*handle).ok_or_else(|| {
                Error::internal(format!("unknown embedded object #{}", handle))
            })?),
            FormKind::Vector(items) => {
                let values = self.eval_all(ctx, items, env)?;
                Ok(ctx.vector_from(values)?)
            }
            FormKind::Set(items) => {
                let values = self.eval_all(ctx, items, env)?;
                Ok(ctx.set_from(values)?)
            }
            FormKind::Map(items) => {
                let values = self.eval_all(ctx, items, env)?;
                let pairs: Vec<(Value, Value)> =
                    values.chunks(2).map(|pair| (pair[0], pair[1])).collect();
                Ok(ctx.map_from(pairs)?)
            }
            FormKind::List(items) => match items.first() {
                None => Ok(ctx.list_from([])?),
                Some(head) => match head.as_symbol() {
                    Some(name) if is_special_form(name) => {
                        self.eval_special(ctx, name, form, items, env)
                    }
                    _ => self.eval_call(ctx, items, env),
                },
            },
        }
    }

    /// Evaluate `forms` left to right. Each value stays rooted until the
    /// whole list is done.
    fn eval_all(&mut self, ctx: &mut Context, forms: &[Form], env: &Env) -> Flow<Vec<Value>> {
        let mark = self.temps.len();
        let result = self.push_all(ctx, forms, env);
        let values = self.temps.split_off(mark);
        result.map(|()| values)
    }

    fn push_all(&mut self, ctx: &mut Context, forms: &[Form], env: &Env) -> Flow<()> {
        for form in forms {
            let value = self.eval(ctx, form, env)?;
            self.temps.push(value);
        }
        Ok(())
    }

    fn resolve(&self, ctx: &Context, name: &str, env: &Env) -> Result<Value> {
        ctx.interner
            .get(name)
            .and_then(|sym| env.lookup(sym))
            .ok_or_else(|| Error::unresolved(name).at(self.cursor))
    }

    /// `(f arg*)`: operator, then arguments left to right, then invoke.
    fn eval_call(&mut self, ctx: &mut Context, items: &[Form], env: &Env) -> Flow<Value> {
        let site = self.cursor;
        let f = self.eval(ctx, &items[0], env)?;
        let args = self.holding(ctx, &[f], |walker, ctx| walker.eval_all(ctx, &items[1..], env))?;
        let arg_locs: Vec<SourceLoc> = items[1..].iter().map(|item| item.loc.or(site)).collect();
        Ok(self.invoke(ctx, f, &args, site, &arg_locs)?)
    }
}

impl Caller for TreeWalk {
    fn call(&mut self, ctx: &mut Context, f: Value, args: &[Value]) -> Result<Value> {
        let site = ctx.sources.call_site();
        self.invoke(ctx, f, args, site, &[])
    }
}

impl Backend for TreeWalk {
    fn name(&self) -> &'static str {
        "tree-walk"
    }

    fn as_caller(&mut self) -> &mut dyn Caller {
        self
    }

    fn eval_form(&mut self, ctx: &mut Context, form: &Form) -> Result<Value> {
        self.cursor = SourceLoc::UNKNOWN;
        let root = ctx.root_env().clone();
        self.eval(ctx, form, &root).map_err(into_error)
    }
}
