// cinder-core - Function application
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Function application for the tree-walking backend.

use std::rc::Rc;

use cinder_reader::SourceLoc;

use super::{TreeWalk, Unwind};
use crate::backend::callable_body;
use crate::builtins::call_data;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::function::{Closure, FnArity, FnBody};
use crate::value::Value;

impl TreeWalk {
    /// Invoke `f`. `site` is the call's location; `arg_locs` holds the
    /// location of each argument form (empty for calls from natives).
    pub(super) fn invoke(
        &mut self,
        ctx: &mut Context,
        f: Value,
        args: &[Value],
        site: SourceLoc,
        arg_locs: &[SourceLoc],
    ) -> Result<Value> {
        let body = match f {
            Value::Fn(_) => callable_body(ctx, f).map_err(|e| e.or_at(site))?,
            Value::Keyword(_) | Value::Map(_) | Value::Set(_) | Value::Vector(_) => {
                return self.with_sources(ctx, site, arg_locs, |_, ctx| call_data(ctx, f, args));
            }
            other => return Err(Error::not_callable(other.type_name()).at(site)),
        };
        match body {
            FnBody::Native(native) => self.with_sources(ctx, site, arg_locs, |walker, ctx| {
                ctx.call_native(walker, &native, args)
            }),
            FnBody::Interpreted(closure) => self
                .apply_closure(ctx, f, &closure, args)
                .map_err(|e| e.or_at(site)),
            FnBody::Compiled { .. } => Err(Error::internal(
                "compiled function called from the tree-walk backend",
            )
            .at(site)),
        }
    }

    /// Run `f` with the attribution table describing this call, restoring
    /// the caller's table afterwards.
    fn with_sources(
        &mut self,
        ctx: &mut Context,
        site: SourceLoc,
        arg_locs: &[SourceLoc],
        f: impl FnOnce(&mut Self, &mut Context) -> Result<Value>,
    ) -> Result<Value> {
        let saved = ctx.sources.snapshot();
        ctx.sources.begin_call(site);
        for (i, loc) in arg_locs.iter().enumerate() {
            ctx.sources.record(i, *loc);
        }
        let result = f(self, ctx).map_err(|e| e.or_at(site));
        ctx.sources.restore(saved);
        result
    }

    fn apply_closure(
        &mut self,
        ctx: &mut Context,
        f: Value,
        closure: &Rc<Closure>,
        args: &[Value],
    ) -> Result<Value> {
        let Some(arity) = closure.select_arity(args.len()) else {
            let name = closure.name.map_or("fn", |sym| ctx.sym_name(sym));
            return Err(Error::arity_spec(name, closure.arity_spec(), args.len()));
        };
        ctx.enter_call()?;
        let saved = self.cursor;
        self.cursor = closure.loc;
        let mark = self.scopes.len();
        let result = self.holding(ctx, &[f], |walker, ctx| {
            walker.run_arity(ctx, f, closure, arity, args)
        });
        self.scopes.truncate(mark);
        self.cursor = saved;
        ctx.exit_call();
        result
    }

    /// Evaluate one arity's body, looping on `recur`. Each pass binds a
    /// fresh scope, roots it in place of the previous one, then reaches a
    /// safe point.
    fn run_arity(
        &mut self,
        ctx: &mut Context,
        f: Value,
        closure: &Closure,
        arity: &FnArity,
        args: &[Value],
    ) -> Result<Value> {
        let fixed = arity.params.len();
        let mark = self.scopes.len();
        let mut values = args.to_vec();
        let mut from_recur = false;
        loop {
            let env = closure.env.child();
            if let Some(name) = closure.name {
                env.define(name, f);
            }
            for (param, value) in arity.params.iter().zip(&values) {
                env.define(*param, *value);
            }
            if let Some(rest) = arity.rest {
                let rest_value = if from_recur {
                    values.get(fixed).copied().unwrap_or(Value::Nil)
                } else if values.len() > fixed {
                    ctx.list_from(values[fixed..].iter().copied())?
                } else {
                    Value::Nil
                };
                env.define(rest, rest_value);
            }
            self.scopes.truncate(mark);
            self.scopes.push(env.clone());
            self.safe_point(ctx);

            match self.eval_body(ctx, &arity.body, &env) {
                Ok(value) => return Ok(value),
                Err(Unwind::Recur(next)) => {
                    values = next;
                    from_recur = true;
                }
                Err(Unwind::Error(err)) => return Err(err),
            }
        }
    }
}
