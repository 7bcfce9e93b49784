// cinder-core - Value printer
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printing values as source text.

use std::fmt::Write;

use cinder_reader::{format_float, write_char_literal, write_escaped_str};

use crate::context::Context;
use crate::function::FnBody;
use crate::value::{Object, Value};

/// Nesting beyond this prints as `...` (atoms may contain themselves).
const MAX_PRINT_DEPTH: usize = 64;

/// Print `v`. With `readably`, strings and characters print as literals.
pub fn print_value(ctx: &Context, v: Value, readably: bool) -> String {
    let mut out = String::new();
    write_value(ctx, &mut out, v, readably, 0);
    out
}

fn write_value(ctx: &Context, out: &mut String, v: Value, readably: bool, depth: usize) {
    if depth > MAX_PRINT_DEPTH {
        out.push_str("...");
        return;
    }
    match v {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Float(n) => out.push_str(&format_float(n)),
        Value::Char(c) => {
            if readably {
                let _ = write_char_literal(out, c);
            } else {
                out.push(c);
            }
        }
        Value::Symbol(s) => out.push_str(ctx.sym_name(s)),
        Value::Keyword(s) => {
            out.push(':');
            out.push_str(ctx.sym_name(s));
        }
        _ => write_object(ctx, out, v, readably, depth),
    }
}

fn write_object(ctx: &Context, out: &mut String, v: Value, readably: bool, depth: usize) {
    let object = match ctx.object(v) {
        Ok(object) => object,
        Err(_) => {
            out.push_str("#<freed>");
            return;
        }
    };
    match object {
        Object::Str(s) => {
            if readably {
                let _ = write_escaped_str(out, s);
            } else {
                out.push_str(s);
            }
        }
        Object::List(seq) => write_seq(ctx, out, "(", seq.items.iter().copied(), ")", readably, depth),
        Object::Vector(seq) => {
            write_seq(ctx, out, "[", seq.items.iter().copied(), "]", readably, depth)
        }
        Object::Set(set) => write_seq(ctx, out, "#{", set.iter(), "}", readably, depth),
        Object::Map(map) => {
            out.push('{');
            for (i, (k, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(ctx, out, k, readably, depth + 1);
                out.push(' ');
                write_value(ctx, out, val, readably, depth + 1);
            }
            out.push('}');
        }
        Object::Fn(f) => {
            let label = match (&f.body, f.is_macro) {
                (_, true) => "macro",
                (FnBody::Native(_), _) => "native-fn",
                _ => "fn",
            };
            match f.name {
                Some(name) => {
                    let _ = write!(out, "#<{} {}>", label, ctx.sym_name(name));
                }
                None => {
                    let _ = write!(out, "#<{}>", label);
                }
            }
        }
        Object::Atom(inner) => {
            out.push_str("#<atom ");
            write_value(ctx, out, *inner, true, depth + 1);
            out.push('>');
        }
        Object::Host(host) => {
            let _ = write!(out, "#<host {}>", host.type_name);
        }
    }
}

fn write_seq(
    ctx: &Context,
    out: &mut String,
    open: &str,
    items: impl Iterator<Item = Value>,
    close: &str,
    readably: bool,
    depth: usize,
) {
    out.push_str(open);
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_value(ctx, out, item, readably, depth + 1);
    }
    out.push_str(close);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_nested_collections() {
        let mut ctx = Context::default();
        let s = ctx.alloc_str("hi").unwrap();
        let kw = ctx.keyword("a");
        let inner = ctx.vector_from([Value::Int(1), Value::Float(2.0)]).unwrap();
        let map = ctx.map_from([(kw, inner)]).unwrap();
        let list = ctx.list_from([s, map, Value::Char('x')]).unwrap();
        assert_eq!(print_value(&ctx, list, true), "(\"hi\" {:a [1 2.0]} \\x)");
        assert_eq!(print_value(&ctx, list, false), "(hi {:a [1 2.0]} x)");
    }

    #[test]
    fn self_containing_atom_terminates() {
        let mut ctx = Context::default();
        let atom = ctx.alloc_atom(Value::Nil).unwrap();
        if let Some(r) = atom.heap_ref() {
            *ctx.heap.get_mut(r).unwrap() = Object::Atom(atom);
        }
        assert!(print_value(&ctx, atom, true).contains("..."));
    }
}
