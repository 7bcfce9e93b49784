// cinder-core - Macro expander
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Macro expansion with source locations preserved.
//!
//! Macros receive their arguments as runtime values and return a value that
//! is turned back into a form. Lists and vectors converted from forms carry
//! the form's location as a tag, so code a macro passes through unchanged
//! keeps pointing at the user's source. If the whole expansion has no
//! location, it takes the macro call site's.
//!
//! Expansion runs with the collector inhibited: the argument values and
//! intermediate results live only in Rust locals.

use std::collections::HashMap;

use cinder_reader::{Form, FormKind, SourceLoc};
use im::Vector;

use crate::analyze::is_special_form;
use crate::backend::Caller;
use crate::collections::Seq;
use crate::context::Context;
use crate::error::{Error, ErrorKind, Result};
use crate::value::{Object, Value};

// ============================================================================
// Form <-> value
// ============================================================================

/// Convert a form to a runtime value. Lists and vectors keep the form's
/// location as a tag.
pub fn form_to_value(ctx: &mut Context, form: &Form) -> Result<Value> {
    Ok(match &form.kind {
        FormKind::Nil => Value::Nil,
        FormKind::Bool(b) => Value::Bool(*b),
        FormKind::Int(n) => Value::Int(*n),
        FormKind::Float(n) => Value::Float(*n),
        FormKind::Char(c) => Value::Char(*c),
        FormKind::Str(s) => ctx.alloc_str(s)?,
        FormKind::Symbol(name) => ctx.symbol(name),
        FormKind::Keyword(name) => ctx.keyword(name),
        FormKind::List(items) => {
            let values = forms_to_values(ctx, items)?;
            Value::List(ctx.alloc(Object::List(Seq::tagged(values, form.loc)))?)
        }
        FormKind::Vector(items) => {
            let values = forms_to_values(ctx, items)?;
            Value::Vector(ctx.alloc(Object::Vector(Seq::tagged(values, form.loc)))?)
        }
        FormKind::Map(items) => {
            let values = forms_to_values(ctx, items)?;
            let pairs: Vec<(Value, Value)> = values
                .iter()
                .copied()
                .collect::<Vec<_>>()
                .chunks(2)
                .map(|pair| (pair[0], pair.get(1).copied().unwrap_or(Value::Nil)))
                .collect();
            ctx.map_from(pairs)?
        }
        FormKind::Set(items) => {
            let values = forms_to_values(ctx, items)?;
            ctx.set_from(values)?
        }
        FormKind::Opaque(handle) => ctx
            .embedded(*handle)
            .ok_or_else(|| Error::internal(format!("unknown embedded object #{}", handle)))?,
    })
}

fn forms_to_values(ctx: &mut Context, forms: &[Form]) -> Result<Vector<Value>> {
    forms.iter().map(|f| form_to_value(ctx, f)).collect()
}

/// Convert a runtime value back to a form. Tagged lists and vectors get
/// their location back; everything else has none. Functions, atoms and
/// host objects become opaque handles.
pub fn value_to_form(ctx: &mut Context, v: Value) -> Result<Form> {
    let kind = match v {
        Value::Nil => FormKind::Nil,
        Value::Bool(b) => FormKind::Bool(b),
        Value::Int(n) => FormKind::Int(n),
        Value::Float(n) => FormKind::Float(n),
        Value::Char(c) => FormKind::Char(c),
        Value::Symbol(s) => FormKind::Symbol(ctx.sym_name(s).to_string()),
        Value::Keyword(s) => FormKind::Keyword(ctx.sym_name(s).to_string()),
        Value::Str(_) => FormKind::Str(
            ctx.str_of(v)?
                .map(|s| s.to_string())
                .unwrap_or_default(),
        ),
        Value::List(_) | Value::Vector(_) => {
            let Some(seq) = ctx.seq_of(v)? else {
                return Err(Error::internal("sequence value without sequence payload"));
            };
            let (items, loc) = (seq.items.clone(), seq.loc);
            let forms = items
                .iter()
                .map(|item| value_to_form(ctx, *item))
                .collect::<Result<Vec<_>>>()?;
            let kind = if matches!(v, Value::List(_)) {
                FormKind::List(forms)
            } else {
                FormKind::Vector(forms)
            };
            return Ok(Form::new(kind, loc));
        }
        Value::Map(_) => {
            let map = ctx.map_of(v)?.unwrap_or_default();
            let mut forms = Vec::with_capacity(map.len() * 2);
            for (key, val) in map.iter() {
                forms.push(value_to_form(ctx, key)?);
                forms.push(value_to_form(ctx, val)?);
            }
            FormKind::Map(forms)
        }
        Value::Set(_) => {
            let set = ctx.set_of(v)?.unwrap_or_default();
            let forms = set
                .iter()
                .map(|item| value_to_form(ctx, item))
                .collect::<Result<Vec<_>>>()?;
            FormKind::Set(forms)
        }
        Value::Fn(_) | Value::Atom(_) | Value::Host(_) => FormKind::Opaque(ctx.embed(v)),
    };
    Ok(Form::synthetic(kind))
}

// ============================================================================
// Entry points
// ============================================================================

/// Expand every macro call in `form`.
pub fn expand(ctx: &mut Context, caller: &mut dyn Caller, form: &Form) -> Result<Form> {
    ctx.inhibit_gc();
    let result = Expander::new(ctx, caller).form(form, 0);
    ctx.allow_gc();
    result
}

/// Expand `form` only while its head is a macro call.
pub fn expand_head(ctx: &mut Context, caller: &mut dyn Caller, form: &Form) -> Result<Form> {
    ctx.inhibit_gc();
    let result = Expander::new(ctx, caller).head(form, usize::MAX);
    ctx.allow_gc();
    result
}

/// Expand the head of `form` once. `None` if it is not a macro call.
pub fn macroexpand_1(
    ctx: &mut Context,
    caller: &mut dyn Caller,
    form: &Form,
) -> Result<Option<Form>> {
    ctx.inhibit_gc();
    let mut expander = Expander::new(ctx, caller);
    expander.cursor = form.loc;
    let result = match expander.macro_call(form) {
        Some((mac, name)) => expander.expand_call(mac, &name, form, 0).map(Some),
        None => Ok(None),
    };
    ctx.allow_gc();
    result
}

// ============================================================================
// Expander
// ============================================================================

struct Expander<'a> {
    ctx: &'a mut Context,
    caller: &'a mut dyn Caller,
    /// Names bound by enclosing fn/let/loop/catch forms. A local shadows a
    /// global macro of the same name.
    locals: Vec<String>,
    cursor: SourceLoc,
}

impl<'a> Expander<'a> {
    fn new(ctx: &'a mut Context, caller: &'a mut dyn Caller) -> Self {
        Expander {
            ctx,
            caller,
            locals: Vec::new(),
            cursor: SourceLoc::UNKNOWN,
        }
    }

    /// The macro named by the head of `form`, if any.
    fn macro_call(&self, form: &Form) -> Option<(Value, String)> {
        let name = form.head_symbol()?;
        if is_special_form(name) || self.locals.iter().any(|l| l == name) {
            return None;
        }
        let sym = self.ctx.interner.get(name)?;
        let value = self.ctx.lookup_global(sym)?;
        self.ctx.is_macro(value).then(|| (value, name.to_string()))
    }

    fn expand_call(&mut self, mac: Value, name: &str, form: &Form, depth: usize) -> Result<Form> {
        let site = form.loc.or(self.cursor);
        let limit = self.ctx.config.max_macro_depth;
        if depth >= limit {
            return Err(Error::new(
                ErrorKind::MacroExpansionDepthExceeded,
                format!("Macro expansion of {} exceeded depth {}", name, limit),
            )
            .at(site));
        }

        let args = form
            .children()
            .get(1..)
            .unwrap_or(&[])
            .iter()
            .map(|f| form_to_value(self.ctx, f))
            .collect::<Result<Vec<_>>>()?;

        let saved = self.ctx.sources.snapshot();
        self.ctx.sources.begin_call(site);
        let result = self.caller.call(self.ctx, mac, &args);
        self.ctx.sources.restore(saved);

        let value = result.map_err(|e| e.or_at(site))?;
        let mut expansion = value_to_form(self.ctx, value)?;
        if !expansion.loc.is_known() {
            expansion.loc = site;
        }
        log::debug!("expanded {} at {} (depth {})", name, site, depth);
        Ok(expansion)
    }

    fn head(&mut self, form: &Form, max_steps: usize) -> Result<Form> {
        self.cursor = form.loc;
        let mut current = form.clone();
        let mut depth = 0;
        while depth < max_steps {
            let Some((mac, name)) = self.macro_call(&current) else {
                break;
            };
            current = self.expand_call(mac, &name, &current, depth)?;
            self.cursor = current.loc.or(self.cursor);
            depth += 1;
        }
        Ok(current)
    }

    fn form(&mut self, form: &Form, depth: usize) -> Result<Form> {
        let saved = self.cursor;
        self.cursor = form.loc.or(saved);
        let result = self.form_inner(form, depth);
        self.cursor = saved;
        result
    }

    fn all(&mut self, forms: &[Form], depth: usize) -> Result<Vec<Form>> {
        forms.iter().map(|f| self.form(f, depth)).collect()
    }

    fn form_inner(&mut self, form: &Form, depth: usize) -> Result<Form> {
        let kind = match &form.kind {
            FormKind::List(items) if !items.is_empty() => return self.list(form, items, depth),
            FormKind::Vector(items) => FormKind::Vector(self.all(items, depth)?),
            FormKind::Map(items) => FormKind::Map(self.all(items, depth)?),
            FormKind::Set(items) => FormKind::Set(self.all(items, depth)?),
            _ => return Ok(form.clone()),
        };
        Ok(Form::new(kind, form.loc))
    }

    fn list(&mut self, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        if let Some(name) = items[0].as_symbol()
            && is_special_form(name)
        {
            return self.special(name, form, items, depth);
        }
        if let Some((mac, name)) = self.macro_call(form) {
            let expansion = self.expand_call(mac, &name, form, depth)?;
            return self.form(&expansion, depth + 1);
        }
        Ok(Form::list(self.all(items, depth)?, form.loc))
    }

    fn special(&mut self, name: &str, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        match name {
            "quote" => Ok(form.clone()),
            "syntax-quote" => {
                let [_, template] = items else {
                    return Err(Error::syntax("syntax-quote", "expected exactly one form")
                        .at(self.cursor));
                };
                let rewritten = SyntaxQuote::new(self.ctx).quote(template)?;
                self.form(&rewritten, depth)
            }
            "fn" | "fn*" => self.scoped(|ex| ex.fn_form(form, items, depth)),
            "defmacro" => self.scoped(|ex| ex.defmacro_form(form, items, depth)),
            "let" | "let*" | "loop" | "loop*" => {
                self.scoped(|ex| ex.binding_form(form, items, depth))
            }
            "try" => self.try_form(form, items, depth),
            _ => Ok(Form::list(self.all(items, depth)?, form.loc)),
        }
    }

    /// Run `f`, then drop any locals it bound.
    fn scoped(&mut self, f: impl FnOnce(&mut Self) -> Result<Form>) -> Result<Form> {
        let mark = self.locals.len();
        let result = f(self);
        self.locals.truncate(mark);
        result
    }

    fn bind_params(&mut self, params: &Form) {
        for p in params.children() {
            if let Some(name) = p.as_symbol()
                && name != "&"
            {
                self.locals.push(name.to_string());
            }
        }
    }

    /// `[params] body*` with the params in scope for the body.
    fn arity(&mut self, parts: &[Form], depth: usize) -> Result<Vec<Form>> {
        let Some(params) = parts.first() else {
            return Ok(Vec::new());
        };
        let mark = self.locals.len();
        self.bind_params(params);
        let body = self.all(&parts[1..], depth);
        self.locals.truncate(mark);
        let mut out = vec![params.clone()];
        out.extend(body?);
        Ok(out)
    }

    fn arities(&mut self, rest: &[Form], out: &mut Vec<Form>, depth: usize) -> Result<()> {
        if rest.first().is_some_and(|f| f.as_vector().is_some()) {
            out.extend(self.arity(rest, depth)?);
            return Ok(());
        }
        for clause in rest {
            match clause.as_list() {
                Some(parts) => {
                    let saved = self.cursor;
                    self.cursor = clause.loc.or(saved);
                    let expanded = self.arity(parts, depth);
                    self.cursor = saved;
                    out.push(Form::list(expanded?, clause.loc));
                }
                None => out.push(clause.clone()),
            }
        }
        Ok(())
    }

    fn fn_form(&mut self, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        let mut out = vec![items[0].clone()];
        let mut rest = &items[1..];
        if let Some(first) = rest.first()
            && let Some(name) = first.as_symbol()
        {
            self.locals.push(name.to_string());
            out.push(first.clone());
            rest = &rest[1..];
        }
        self.arities(rest, &mut out, depth)?;
        Ok(Form::list(out, form.loc))
    }

    fn defmacro_form(&mut self, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        let mut out = vec![items[0].clone()];
        let mut rest = &items[1..];
        if let Some(name) = rest.first() {
            out.push(name.clone());
            rest = &rest[1..];
        }
        if let Some(doc) = rest.first()
            && matches!(doc.kind, FormKind::Str(_))
            && rest.len() > 1
        {
            out.push(doc.clone());
            rest = &rest[1..];
        }
        self.arities(rest, &mut out, depth)?;
        Ok(Form::list(out, form.loc))
    }

    fn binding_form(&mut self, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        let mut out = vec![items[0].clone()];
        let Some(bindings) = items.get(1) else {
            return Ok(form.clone());
        };
        match bindings.as_vector() {
            Some(pairs) => {
                let mut expanded = Vec::with_capacity(pairs.len());
                for pair in pairs.chunks(2) {
                    expanded.push(pair[0].clone());
                    if let Some(init) = pair.get(1) {
                        expanded.push(self.form(init, depth)?);
                    }
                    if let Some(name) = pair[0].as_symbol() {
                        self.locals.push(name.to_string());
                    }
                }
                out.push(Form::vector(expanded, bindings.loc));
            }
            None => out.push(bindings.clone()),
        }
        out.extend(self.all(&items[2..], depth)?);
        Ok(Form::list(out, form.loc))
    }

    fn try_form(&mut self, form: &Form, items: &[Form], depth: usize) -> Result<Form> {
        let mut out = vec![items[0].clone()];
        for clause in &items[1..] {
            if clause.is_call_to("catch")
                && let Some(parts) = clause.as_list()
                && parts.len() >= 3
            {
                let saved = self.cursor;
                self.cursor = clause.loc.or(saved);
                let mark = self.locals.len();
                if let Some(binding) = parts[2].as_symbol() {
                    self.locals.push(binding.to_string());
                }
                let body = self.all(&parts[3..], depth);
                self.locals.truncate(mark);
                self.cursor = saved;

                let mut catch = parts[..3].to_vec();
                catch.extend(body?);
                out.push(Form::list(catch, clause.loc));
            } else {
                out.push(self.form(clause, depth)?);
            }
        }
        Ok(Form::list(out, form.loc))
    }
}

// ============================================================================
// Syntax-quote
// ============================================================================

/// Rewrites a syntax-quoted template into code that builds it.
///
/// `` `(a ~b ~@c) `` becomes `(seq (concat (list (quote a)) (list b) c))`.
/// Vectors, maps and sets are built with `apply` over the same `concat`.
/// Symbols ending in `#` become one fresh name per template.
struct SyntaxQuote<'a> {
    ctx: &'a mut Context,
    gensyms: HashMap<String, String>,
}

fn call(name: &str, mut args: Vec<Form>, loc: SourceLoc) -> Form {
    args.insert(0, Form::symbol(name, loc));
    Form::list(args, loc)
}

impl<'a> SyntaxQuote<'a> {
    fn new(ctx: &'a mut Context) -> Self {
        SyntaxQuote {
            ctx,
            gensyms: HashMap::new(),
        }
    }

    fn auto_gensym(&mut self, base: &str) -> String {
        if let Some(name) = self.gensyms.get(base) {
            return name.clone();
        }
        let name = format!("{}__auto__", self.ctx.gensym(&format!("{}__", base)));
        self.gensyms.insert(base.to_string(), name.clone());
        name
    }

    fn quote(&mut self, form: &Form) -> Result<Form> {
        let loc = form.loc;
        match &form.kind {
            FormKind::Symbol(name) => {
                let name = match name.strip_suffix('#') {
                    Some(base) if !base.is_empty() => self.auto_gensym(base),
                    _ => name.clone(),
                };
                Ok(call("quote", vec![Form::symbol(name, loc)], loc))
            }
            FormKind::List(items) if form.is_call_to("unquote") => match items.as_slice() {
                [_, inner] => Ok(inner.clone()),
                _ => Err(Error::syntax("unquote", "expected exactly one form").at(loc)),
            },
            FormKind::List(_) if form.is_call_to("unquote-splicing") => {
                Err(Error::syntax("unquote-splicing", "splice not in list").at(loc))
            }
            FormKind::List(items) if form.is_call_to("syntax-quote") && items.len() == 2 => {
                let inner = self.quote(&items[1])?;
                self.quote(&inner)
            }
            FormKind::List(items) if items.is_empty() => Ok(call("list", Vec::new(), loc)),
            FormKind::List(items) => Ok(call("seq", vec![self.concat(items, loc)?], loc)),
            FormKind::Vector(items) => self.apply("vector", items, loc),
            FormKind::Map(items) => self.apply("hash-map", items, loc),
            FormKind::Set(items) => self.apply("hash-set", items, loc),
            _ => Ok(form.clone()),
        }
    }

    fn apply(&mut self, ctor: &str, items: &[Form], loc: SourceLoc) -> Result<Form> {
        let concat = self.concat(items, loc)?;
        Ok(call("apply", vec![Form::symbol(ctor, loc), concat], loc))
    }

    fn concat(&mut self, items: &[Form], loc: SourceLoc) -> Result<Form> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let part = match item.as_list() {
                Some([_, inner]) if item.is_call_to("unquote-splicing") => inner.clone(),
                Some([_, inner]) if item.is_call_to("unquote") => {
                    call("list", vec![inner.clone()], item.loc.or(loc))
                }
                _ => call("list", vec![self.quote(item)?], item.loc.or(loc)),
            };
            parts.push(part);
        }
        Ok(call("concat", parts, loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_reader::Parser;

    fn parse(src: &str) -> Form {
        Parser::parse_str(src).unwrap().unwrap()
    }

    #[test]
    fn form_value_round_trip_keeps_locations() {
        let mut ctx = Context::default();
        let form = parse("(a [1 \"two\" :three] {:k \\c})");
        let value = form_to_value(&mut ctx, &form).unwrap();
        let back = value_to_form(&mut ctx, value).unwrap();
        assert_eq!(back.to_string(), form.to_string());
        assert_eq!(back.loc, form.loc);
        assert_eq!(back.children()[1].loc, form.children()[1].loc);
        // leaves are not tagged
        assert_eq!(back.children()[0].loc, SourceLoc::UNKNOWN);
    }

    #[test]
    fn syntax_quote_rewrite() {
        let mut ctx = Context::default();
        let form = parse("`(a ~b ~@c)");
        let template = &form.children()[1];
        let rewritten = SyntaxQuote::new(&mut ctx).quote(template).unwrap();
        assert_eq!(
            rewritten.to_string(),
            "(seq (concat (list (quote a)) (list b) c))"
        );
    }

    #[test]
    fn auto_gensyms_are_consistent_within_a_template() {
        let mut ctx = Context::default();
        let form = parse("`(let [x# 1] x#)");
        let rewritten = SyntaxQuote::new(&mut ctx).quote(&form.children()[1]).unwrap();
        let text = rewritten.to_string();
        let first = text.find("x__").unwrap();
        let name: String = text[first..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != ')')
            .collect();
        assert!(name.ends_with("__auto__"));
        assert_eq!(text.matches(name.as_str()).count(), 2);
    }

    #[test]
    fn splice_outside_list_is_an_error() {
        let mut ctx = Context::default();
        let form = parse("`~@xs");
        let err = SyntaxQuote::new(&mut ctx)
            .quote(&form.children()[1])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
    }
}
