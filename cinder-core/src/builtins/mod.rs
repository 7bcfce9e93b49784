// cinder-core - Built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Built-in functions shared by both backends.
//!
//! Every built-in is a plain native with the [`NativeFnPtr`] signature.
//! Argument errors are attributed through [`Context::arg_error`], so a
//! built-in never needs to know which backend called it.
//!
//! [`NativeFnPtr`]: crate::function::NativeFnPtr

mod arithmetic;
mod atoms;
mod collections;
mod comparison;
mod exceptions;
mod higher_order;
mod io;
mod predicates;
mod runtime;
mod sequences;

use im::Vector;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;

pub use collections::call_data;

use arithmetic::{
    builtin_add, builtin_dec, builtin_div, builtin_inc, builtin_max, builtin_min, builtin_mod,
    builtin_mul, builtin_quot, builtin_rem, builtin_sub,
};
use atoms::{builtin_atom, builtin_compare_and_set, builtin_deref, builtin_reset, builtin_swap};
use collections::{
    builtin_assoc, builtin_conj, builtin_contains_p, builtin_dissoc, builtin_get,
    builtin_hash_map, builtin_hash_set, builtin_keys, builtin_list, builtin_vals, builtin_vector,
};
use comparison::{
    builtin_eq, builtin_ge, builtin_gt, builtin_identical_p, builtin_le, builtin_lt,
    builtin_not, builtin_not_eq,
};
use exceptions::{builtin_ex_data, builtin_ex_info, builtin_ex_message};
use higher_order::{builtin_apply, builtin_filter, builtin_map, builtin_reduce};
use io::{builtin_pr_str, builtin_print, builtin_println, builtin_prn, builtin_str};
use predicates::{
    builtin_atom_p, builtin_even_p, builtin_fn_p, builtin_int_p, builtin_keyword_p,
    builtin_list_p, builtin_map_p, builtin_neg_p, builtin_nil_p, builtin_number_p,
    builtin_odd_p, builtin_pos_p, builtin_sequential_p, builtin_set_p, builtin_string_p,
    builtin_symbol_p, builtin_vector_p, builtin_zero_p,
};
use runtime::{builtin_gensym, builtin_heap_stats, builtin_macroexpand, builtin_macroexpand_1};
use sequences::{
    builtin_concat, builtin_cons, builtin_count, builtin_empty_p, builtin_first, builtin_last,
    builtin_next, builtin_nth, builtin_range, builtin_rest, builtin_reverse, builtin_second,
    builtin_seq,
};

/// Register all built-in functions in the context's root environment.
pub fn register_builtins(ctx: &mut Context) -> Result<()> {
    // Arithmetic
    ctx.define_native("+", builtin_add)?;
    ctx.define_native("-", builtin_sub)?;
    ctx.define_native("*", builtin_mul)?;
    ctx.define_native("/", builtin_div)?;
    ctx.define_native("quot", builtin_quot)?;
    ctx.define_native("rem", builtin_rem)?;
    ctx.define_native("mod", builtin_mod)?;
    ctx.define_native("inc", builtin_inc)?;
    ctx.define_native("dec", builtin_dec)?;
    ctx.define_native("max", builtin_max)?;
    ctx.define_native("min", builtin_min)?;

    // Comparison
    ctx.define_native("=", builtin_eq)?;
    ctx.define_native("not=", builtin_not_eq)?;
    ctx.define_native("<", builtin_lt)?;
    ctx.define_native(">", builtin_gt)?;
    ctx.define_native("<=", builtin_le)?;
    ctx.define_native(">=", builtin_ge)?;
    ctx.define_native("identical?", builtin_identical_p)?;
    ctx.define_native("not", builtin_not)?;

    // Predicates
    ctx.define_native("nil?", builtin_nil_p)?;
    ctx.define_native("number?", builtin_number_p)?;
    ctx.define_native("int?", builtin_int_p)?;
    ctx.define_native("string?", builtin_string_p)?;
    ctx.define_native("symbol?", builtin_symbol_p)?;
    ctx.define_native("keyword?", builtin_keyword_p)?;
    ctx.define_native("list?", builtin_list_p)?;
    ctx.define_native("vector?", builtin_vector_p)?;
    ctx.define_native("map?", builtin_map_p)?;
    ctx.define_native("set?", builtin_set_p)?;
    ctx.define_native("fn?", builtin_fn_p)?;
    ctx.define_native("atom?", builtin_atom_p)?;
    ctx.define_native("sequential?", builtin_sequential_p)?;
    ctx.define_native("zero?", builtin_zero_p)?;
    ctx.define_native("pos?", builtin_pos_p)?;
    ctx.define_native("neg?", builtin_neg_p)?;
    ctx.define_native("even?", builtin_even_p)?;
    ctx.define_native("odd?", builtin_odd_p)?;

    // Collections
    ctx.define_native("list", builtin_list)?;
    ctx.define_native("vector", builtin_vector)?;
    ctx.define_native("hash-map", builtin_hash_map)?;
    ctx.define_native("hash-set", builtin_hash_set)?;
    ctx.define_native("conj", builtin_conj)?;
    ctx.define_native("assoc", builtin_assoc)?;
    ctx.define_native("dissoc", builtin_dissoc)?;
    ctx.define_native("get", builtin_get)?;
    ctx.define_native("contains?", builtin_contains_p)?;
    ctx.define_native("keys", builtin_keys)?;
    ctx.define_native("vals", builtin_vals)?;

    // Sequences
    ctx.define_native("first", builtin_first)?;
    ctx.define_native("second", builtin_second)?;
    ctx.define_native("last", builtin_last)?;
    ctx.define_native("rest", builtin_rest)?;
    ctx.define_native("next", builtin_next)?;
    ctx.define_native("cons", builtin_cons)?;
    ctx.define_native("count", builtin_count)?;
    ctx.define_native("nth", builtin_nth)?;
    ctx.define_native("seq", builtin_seq)?;
    ctx.define_native("concat", builtin_concat)?;
    ctx.define_native("empty?", builtin_empty_p)?;
    ctx.define_native("reverse", builtin_reverse)?;
    ctx.define_native("range", builtin_range)?;

    // Higher-order functions
    ctx.define_native("apply", builtin_apply)?;
    ctx.define_native("map", builtin_map)?;
    ctx.define_native("filter", builtin_filter)?;
    ctx.define_native("reduce", builtin_reduce)?;

    // Atoms
    ctx.define_native("atom", builtin_atom)?;
    ctx.define_native("deref", builtin_deref)?;
    ctx.define_native("reset!", builtin_reset)?;
    ctx.define_native("swap!", builtin_swap)?;
    ctx.define_native("compare-and-set!", builtin_compare_and_set)?;

    // Output
    ctx.define_native("str", builtin_str)?;
    ctx.define_native("pr-str", builtin_pr_str)?;
    ctx.define_native("print", builtin_print)?;
    ctx.define_native("println", builtin_println)?;
    ctx.define_native("prn", builtin_prn)?;

    // Exceptions
    ctx.define_native("ex-info", builtin_ex_info)?;
    ctx.define_native("ex-data", builtin_ex_data)?;
    ctx.define_native("ex-message", builtin_ex_message)?;

    // Runtime
    ctx.define_native("gensym", builtin_gensym)?;
    ctx.define_native("heap-stats", builtin_heap_stats)?;
    ctx.define_native("macroexpand-1", builtin_macroexpand_1)?;
    ctx.define_native("macroexpand", builtin_macroexpand)?;

    log::debug!("registered {} root bindings", ctx.root_env().len());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// A type error blamed on argument `index`.
pub(crate) fn arg_type_error(
    ctx: &Context,
    name: &str,
    index: usize,
    expected: &str,
    got: Value,
) -> Error {
    ctx.arg_error(index, Error::type_error_in(name, expected, got.type_name()))
}

/// The elements of anything sequential: nil, lists, vectors, sets, maps
/// (as `[k v]` vectors) and strings (as characters).
pub(crate) fn seq_values(
    ctx: &mut Context,
    name: &str,
    index: usize,
    coll: Value,
) -> Result<Vector<Value>> {
    match coll {
        Value::Nil => Ok(Vector::new()),
        Value::List(_) | Value::Vector(_) => Ok(ctx.seq_items(coll)?.unwrap_or_default()),
        Value::Set(_) => Ok(ctx
            .set_of(coll)?
            .map(|set| set.iter().collect())
            .unwrap_or_default()),
        Value::Map(_) => {
            let map = ctx.map_of(coll)?.unwrap_or_default();
            let mut entries = Vector::new();
            for (k, v) in map.iter() {
                entries.push_back(ctx.vector_from([k, v])?);
            }
            Ok(entries)
        }
        Value::Str(_) => Ok(ctx
            .str_of(coll)?
            .map(|s| s.chars().map(Value::Char).collect())
            .unwrap_or_default()),
        other => Err(arg_type_error(ctx, name, index, "sequence", other)),
    }
}

/// The integer in argument `index`, or a type error.
pub(crate) fn int_arg(ctx: &Context, name: &str, index: usize, v: Value) -> Result<i64> {
    match v {
        Value::Int(n) => Ok(n),
        other => Err(arg_type_error(ctx, name, index, "integer", other)),
    }
}
