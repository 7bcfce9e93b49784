// cinder-core - Evaluation pipeline
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The single entry point shared by both backends:
//! expand, analyze, then hand the form to a [`Backend`].

use cinder_reader::{Form, read_all};

use crate::analyze::analyze;
use crate::backend::Backend;
use crate::builtins::register_builtins;
use crate::config::EvalConfig;
use crate::context::Context;
use crate::error::Result;
use crate::expander::{expand, expand_head};
use crate::value::Value;

/// Macros written in the language itself, loaded into every context.
const CORE_PRELUDE: &str = include_str!("../../cinder-std/core.clj");

/// Evaluate one top-level form.
///
/// The top-level boundary is a collector safe point. A top-level `do` is
/// split so that a macro defined by one of its forms is visible to the
/// forms after it.
pub fn evaluate(ctx: &mut Context, backend: &mut dyn Backend, form: &Form) -> Result<Value> {
    ctx.check_alive()?;
    if ctx.maybe_collect(&mut |_| {}) {
        log::debug!("collected at top level: {:?}", ctx.heap_stats());
    }
    log::trace!("evaluate [{}] {}", backend.name(), form);

    ctx.begin_top_level();
    let result = evaluate_inner(ctx, backend, form);
    ctx.end_top_level();
    ctx.set_call_depth(0);
    result.map_err(|e| e.or_at(form.loc))
}

fn evaluate_inner(ctx: &mut Context, backend: &mut dyn Backend, form: &Form) -> Result<Value> {
    let head = expand_head(ctx, backend.as_caller(), form)?;
    if head.is_call_to("do") {
        let mut result = Value::Nil;
        for sub in &head.children()[1..] {
            result = evaluate(ctx, backend, sub)?;
        }
        return Ok(result);
    }
    let expanded = expand(ctx, backend.as_caller(), &head)?;
    analyze(&expanded, ctx.config.max_form_depth)?;
    backend.eval_form(ctx, &expanded)
}

/// Read and evaluate every form in `source`, returning the last value.
pub fn eval_source(ctx: &mut Context, backend: &mut dyn Backend, source: &str) -> Result<Value> {
    let forms = read_all(source)?;
    let mut result = Value::Nil;
    for form in &forms {
        result = evaluate(ctx, backend, form)?;
    }
    Ok(result)
}

/// Load the core macros (`defn`, `when`, `cond`, ...) into `ctx`.
pub fn load_prelude(ctx: &mut Context, backend: &mut dyn Backend) -> Result<()> {
    eval_source(ctx, backend, CORE_PRELUDE)?;
    log::debug!("loaded core prelude via {}", backend.name());
    Ok(())
}

/// A context with the built-ins registered and the prelude loaded through
/// `backend`.
pub fn new_context(config: EvalConfig, backend: &mut dyn Backend) -> Result<Context> {
    let mut ctx = Context::new(config);
    register_builtins(&mut ctx)?;
    load_prelude(&mut ctx, backend)?;
    Ok(ctx)
}
