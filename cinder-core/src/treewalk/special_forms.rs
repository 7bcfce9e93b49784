// cinder-core - Special form evaluation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Evaluation rules for the special forms. Shapes come from
//! [`crate::analyze`], which has already validated them.

use std::rc::Rc;

use cinder_reader::Form;

use super::{Flow, TreeWalk, Unwind};
use crate::analyze::{self, ArityShape};
use crate::backend::{caught_value, user_raised};
use crate::context::Context;
use crate::env::Env;
use crate::error::Error;
use crate::expander::form_to_value;
use crate::function::{Closure, FnArity, FnBody, Function};
use crate::interner::Sym;
use crate::value::Value;

impl TreeWalk {
    pub(super) fn eval_special(
        &mut self,
        ctx: &mut Context,
        name: &str,
        form: &Form,
        items: &[Form],
        env: &Env,
    ) -> Flow<Value> {
        match name {
            "quote" => Ok(form_to_value(ctx, &items[1])?),
            "if" => self.eval_if(ctx, items, env),
            "do" => self.eval_body(ctx, &items[1..], env),
            "let" | "let*" => self.eval_let(ctx, form, env),
            "loop" | "loop*" => self.eval_loop(ctx, form, env),
            "recur" => {
                let values = self.eval_all(ctx, &items[1..], env)?;
                Err(Unwind::Recur(values))
            }
            "fn" | "fn*" => Ok(self.eval_fn(ctx, form, env)?),
            "def" => self.eval_def(ctx, form, env),
            "defmacro" => Ok(self.eval_defmacro(ctx, form, env)?),
            "throw" => {
                let payload = self.eval(ctx, &items[1], env)?;
                Err(user_raised(ctx, payload).at(self.cursor).into())
            }
            "try" => self.eval_try(ctx, form, env),
            _ => Err(Error::syntax(name, "not valid in this position")
                .at(self.cursor)
                .into()),
        }
    }

    /// (if test then else?)
    fn eval_if(&mut self, ctx: &mut Context, items: &[Form], env: &Env) -> Flow<Value> {
        let test = self.eval(ctx, &items[1], env)?;
        if test.is_truthy() {
            self.eval(ctx, &items[2], env)
        } else {
            match items.get(3) {
                Some(otherwise) => self.eval(ctx, otherwise, env),
                None => Ok(Value::Nil),
            }
        }
    }

    /// Evaluate bindings in sequence into `scope`.
    fn bind_sequentially(
        &mut self,
        ctx: &mut Context,
        bindings: &[(&str, &Form)],
        scope: &Env,
    ) -> Flow<Vec<Sym>> {
        let mut syms = Vec::with_capacity(bindings.len());
        for (name, init) in bindings {
            let value = self.eval(ctx, init, scope)?;
            let sym = ctx.intern(name);
            scope.define(sym, value);
            syms.push(sym);
        }
        Ok(syms)
    }

    /// (let [name init ...] body*)
    fn eval_let(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        let bindings = analyze::parse_bindings(form, "let")?;
        let scope = env.child();
        self.in_scope(ctx, &scope, |walker, ctx| {
            walker.bind_sequentially(ctx, &bindings, &scope)?;
            walker.eval_body(ctx, analyze::binding_body(form), &scope)
        })
    }

    /// (loop [name init ...] body*) - `recur` rebinds and re-enters
    fn eval_loop(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        let bindings = analyze::parse_bindings(form, "loop")?;
        let mark = self.scopes.len();
        let result = self.run_loop(ctx, &bindings, analyze::binding_body(form), env);
        self.scopes.truncate(mark);
        result
    }

    /// Each iteration gets a fresh scope, rooted in place of the previous
    /// one before the safe point.
    fn run_loop(
        &mut self,
        ctx: &mut Context,
        bindings: &[(&str, &Form)],
        body: &[Form],
        env: &Env,
    ) -> Flow<Value> {
        let mark = self.scopes.len();
        let mut scope = env.child();
        self.scopes.push(scope.clone());
        let syms = self.bind_sequentially(ctx, bindings, &scope)?;
        loop {
            match self.eval_body(ctx, body, &scope) {
                Err(Unwind::Recur(values)) => {
                    scope = env.child();
                    for (sym, value) in syms.iter().zip(values) {
                        scope.define(*sym, value);
                    }
                    self.scopes.truncate(mark);
                    self.scopes.push(scope.clone());
                    self.safe_point(ctx);
                }
                other => return other,
            }
        }
    }

    fn make_arities(ctx: &mut Context, shapes: &[ArityShape<'_>]) -> Vec<FnArity> {
        shapes
            .iter()
            .map(|shape| {
                FnArity::new(
                    shape.params.iter().map(|p| ctx.intern(p)).collect(),
                    shape.rest.map(|r| ctx.intern(r)),
                    Rc::from(shape.body.to_vec()),
                )
            })
            .collect()
    }

    /// (fn name? [params] body*) or (fn name? ([params] body*)+)
    fn eval_fn(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> crate::error::Result<Value> {
        let shape = analyze::parse_fn(form)?;
        let name = shape.name.map(|n| ctx.intern(n));
        let closure = Closure {
            name,
            arities: Self::make_arities(ctx, &shape.arities),
            env: env.clone(),
            loc: self.cursor,
        };
        ctx.alloc_fn(Function {
            name,
            is_macro: false,
            body: FnBody::Interpreted(Rc::new(closure)),
        })
    }

    /// (def name value?) - binds in the root environment, yields the name
    fn eval_def(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        let (name, value_form) = analyze::parse_def(form)?;
        let value = match value_form {
            Some(value_form) => self.eval(ctx, value_form, env)?,
            None => Value::Nil,
        };
        let sym = ctx.intern(name);
        ctx.root_env().define(sym, value);
        Ok(Value::Symbol(sym))
    }

    /// (defmacro name doc? [params] body*)
    fn eval_defmacro(
        &mut self,
        ctx: &mut Context,
        form: &Form,
        env: &Env,
    ) -> crate::error::Result<Value> {
        let (name, shapes) = analyze::parse_defmacro(form)?;
        let sym = ctx.intern(name);
        let closure = Closure {
            name: Some(sym),
            arities: Self::make_arities(ctx, &shapes),
            env: env.clone(),
            loc: self.cursor,
        };
        let mac = ctx.alloc_fn(Function {
            name: Some(sym),
            is_macro: true,
            body: FnBody::Interpreted(Rc::new(closure)),
        })?;
        ctx.root_env().define(sym, mac);
        Ok(Value::Symbol(sym))
    }

    /// (try body* (catch Class e handler*)? (finally cleanup*)?)
    fn eval_try(&mut self, ctx: &mut Context, form: &Form, env: &Env) -> Flow<Value> {
        let shape = analyze::parse_try(form)?;
        let depth = ctx.call_depth();
        let cursor = self.cursor;

        let mut result = self.eval_body(ctx, shape.body, env);
        if let Some((binding, handler)) = shape.catch {
            let caught = match &result {
                Err(Unwind::Error(err)) if !err.is_fatal() => Some(caught_value(ctx, err)?),
                _ => None,
            };
            if let Some(caught) = caught {
                ctx.set_call_depth(depth);
                self.cursor = cursor;
                let scope = env.child();
                let sym = ctx.intern(binding);
                scope.define(sym, caught);
                result = self.in_scope(ctx, &scope, |walker, ctx| {
                    walker.eval_body(ctx, handler, &scope)
                });
            }
        }

        if let Some(cleanup) = shape.finally {
            let fatal = matches!(&result, Err(Unwind::Error(err)) if err.is_fatal());
            if !fatal {
                self.cursor = cursor;
                // the pending outcome must survive collections in the cleanup
                let held: Vec<Value> = match &result {
                    Ok(value) => vec![*value],
                    Err(Unwind::Error(err)) => err.payload.into_iter().collect(),
                    Err(Unwind::Recur(values)) => values.clone(),
                };
                self.holding(ctx, &held, |walker, ctx| walker.eval_body(ctx, cleanup, env))?;
            }
        }
        result
    }
}
