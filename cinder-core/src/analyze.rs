// cinder-core - Special form analysis
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shape parsing and validation of special forms.
//!
//! Both backends read special forms through the shape parsers here, and
//! every expanded top-level form passes through [`analyze`] before either
//! backend sees it. Syntax errors are therefore raised once, with one
//! message and one location, whichever backend is active.

use cinder_reader::{Form, FormKind, SourceLoc};

use crate::error::{Error, Result};

/// Names handled by the evaluator itself rather than by function calls.
pub const SPECIAL_FORMS: &[&str] = &[
    "quote",
    "syntax-quote",
    "if",
    "do",
    "let",
    "let*",
    "loop",
    "loop*",
    "fn",
    "fn*",
    "def",
    "defmacro",
    "recur",
    "throw",
    "try",
    "catch",
    "finally",
];

/// Operators the bytecode compiler emits inline. They cannot be redefined
/// globally, so inline and called forms always agree.
pub const INLINE_OPERATORS: &[&str] = &["+", "-", "*", "/", "<", ">", "<=", ">="];

pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}

// ============================================================================
// Shapes
// ============================================================================

/// One parameter list and body of a `fn`.
#[derive(Debug)]
pub struct ArityShape<'a> {
    pub params: Vec<&'a str>,
    pub rest: Option<&'a str>,
    pub body: &'a [Form],
    /// Location of the parameter vector (or the arity clause).
    pub loc: SourceLoc,
}

impl ArityShape<'_> {
    /// Local slots the arity binds: fixed params plus the rest param.
    pub fn slot_count(&self) -> usize {
        self.params.len() + usize::from(self.rest.is_some())
    }
}

#[derive(Debug)]
pub struct FnShape<'a> {
    pub name: Option<&'a str>,
    pub arities: Vec<ArityShape<'a>>,
}

#[derive(Debug)]
pub struct TryShape<'a> {
    pub body: &'a [Form],
    /// Binding symbol and handler body of the first catch clause.
    pub catch: Option<(&'a str, &'a [Form])>,
    pub finally: Option<&'a [Form]>,
}

/// The items of a list form, or a syntax error naming `what`.
fn list_items<'a>(form: &'a Form, what: &str) -> Result<&'a [Form]> {
    form.as_list()
        .ok_or_else(|| Error::syntax(what, "expected a list").at(form.loc))
}

fn symbol_name<'a>(form: &'a Form, what: &str, role: &str) -> Result<&'a str> {
    form.as_symbol().ok_or_else(|| {
        Error::syntax(what, format!("{} must be a symbol, got {}", role, form.kind_name()))
            .at(form.loc)
    })
}

fn parse_params<'a>(
    vector: &'a Form,
    what: &str,
) -> Result<(Vec<&'a str>, Option<&'a str>)> {
    let items = vector.as_vector().ok_or_else(|| {
        Error::syntax(what, "parameters must be a vector").at(vector.loc)
    })?;
    let mut params = Vec::new();
    let mut rest = None;
    let mut i = 0;
    while i < items.len() {
        let name = symbol_name(&items[i], what, "parameter")?;
        if name == "&" {
            if i + 2 != items.len() {
                return Err(Error::syntax(what, "'&' must be followed by exactly one parameter")
                    .at(items[i].loc.or(vector.loc)));
            }
            let rest_name = symbol_name(&items[i + 1], what, "rest parameter")?;
            rest = Some(rest_name);
            break;
        }
        params.push(name);
        i += 1;
    }
    Ok((params, rest))
}

/// Parse `(fn name? [params] body*)` or `(fn name? ([params] body*)+)`.
pub fn parse_fn(form: &Form) -> Result<FnShape<'_>> {
    let items = list_items(form, "fn")?;
    let mut rest = &items[1..];
    let mut name = None;
    if let Some(first) = rest.first()
        && let Some(n) = first.as_symbol()
    {
        name = Some(n);
        rest = &rest[1..];
    }
    let arities = parse_arities(form, rest, "fn")?;
    Ok(FnShape { name, arities })
}

fn parse_arities<'a>(form: &'a Form, rest: &'a [Form], what: &str) -> Result<Vec<ArityShape<'a>>> {
    let Some(first) = rest.first() else {
        return Err(Error::syntax(what, "missing parameter vector").at(form.loc));
    };

    let mut arities = Vec::new();
    if first.as_vector().is_some() {
        let (params, rest_param) = parse_params(first, what)?;
        arities.push(ArityShape {
            params,
            rest: rest_param,
            body: &rest[1..],
            loc: first.loc,
        });
    } else {
        for clause in rest {
            let items = clause.as_list().ok_or_else(|| {
                Error::syntax(what, "expected a parameter vector or arity clauses")
                    .at(clause.loc.or(form.loc))
            })?;
            let Some(vector) = items.first() else {
                return Err(Error::syntax(what, "empty arity clause").at(clause.loc.or(form.loc)));
            };
            let (params, rest_param) = parse_params(vector, what)?;
            arities.push(ArityShape {
                params,
                rest: rest_param,
                body: &items[1..],
                loc: clause.loc,
            });
        }
    }

    let variadic = arities.iter().filter(|a| a.rest.is_some()).count();
    if variadic > 1 {
        return Err(Error::syntax(what, "can't have more than one variadic overload").at(form.loc));
    }
    for (i, a) in arities.iter().enumerate() {
        if a.rest.is_none()
            && arities[..i]
                .iter()
                .any(|b| b.rest.is_none() && b.params.len() == a.params.len())
        {
            return Err(Error::syntax(
                what,
                "can't have two overloads with the same arity",
            )
            .at(a.loc.or(form.loc)));
        }
    }
    Ok(arities)
}

/// Parse `(defmacro name doc? [params] body*)` (or multi-arity).
pub fn parse_defmacro(form: &Form) -> Result<(&str, Vec<ArityShape<'_>>)> {
    let items = list_items(form, "defmacro")?;
    let Some(name_form) = items.get(1) else {
        return Err(Error::syntax("defmacro", "missing name").at(form.loc));
    };
    let name = symbol_name(name_form, "defmacro", "name")?;
    let mut rest = &items[2..];
    if let Some(first) = rest.first()
        && matches!(first.kind, FormKind::Str(_))
        && rest.len() > 1
    {
        rest = &rest[1..];
    }
    let arities = parse_arities(form, rest, "defmacro")?;
    Ok((name, arities))
}

/// Parse the binding vector of `let` or `loop`.
pub fn parse_bindings<'a>(form: &'a Form, what: &str) -> Result<Vec<(&'a str, &'a Form)>> {
    let items = list_items(form, what)?;
    let Some(vector) = items.get(1) else {
        return Err(Error::syntax(what, "missing binding vector").at(form.loc));
    };
    let pairs = vector.as_vector().ok_or_else(|| {
        Error::syntax(what, "bindings must be a vector").at(vector.loc.or(form.loc))
    })?;
    if pairs.len() % 2 != 0 {
        return Err(Error::syntax(
            what,
            "binding vector requires an even number of forms",
        )
        .at(vector.loc.or(form.loc)));
    }
    pairs
        .chunks(2)
        .map(|pair| {
            let name = pair[0].as_symbol().ok_or_else(|| {
                Error::syntax(
                    what,
                    format!("binding name must be a symbol, got {}", pair[0].kind_name()),
                )
                .at(pair[0].loc.or(vector.loc))
            })?;
            Ok((name, &pair[1]))
        })
        .collect()
}

/// Body forms of `let` / `loop` (everything after the binding vector).
pub fn binding_body(form: &Form) -> &[Form] {
    form.as_list()
        .map(|items| if items.len() > 2 { &items[2..] } else { &[][..] })
        .unwrap_or(&[])
}

/// Parse `(try body* (catch Class e handler*)* (finally cleanup*)?)`.
pub fn parse_try(form: &Form) -> Result<TryShape<'_>> {
    let items = list_items(form, "try")?;
    let clauses = &items[1..];
    let body_end = clauses
        .iter()
        .position(|f| f.is_call_to("catch") || f.is_call_to("finally"))
        .unwrap_or(clauses.len());
    let body = &clauses[..body_end];

    let mut catch = None;
    let mut finally = None;
    for (i, clause) in clauses[body_end..].iter().enumerate() {
        let parts = clause.as_list().unwrap_or(&[]);
        if clause.is_call_to("catch") {
            if finally.is_some() {
                return Err(Error::syntax("try", "finally clause must be last").at(clause.loc));
            }
            if parts.len() < 3 {
                return Err(Error::syntax("catch", "expected (catch Class binding body*)")
                    .at(clause.loc));
            }
            symbol_name(&parts[1], "catch", "exception class")?;
            let binding = symbol_name(&parts[2], "catch", "binding")?;
            if catch.is_none() {
                catch = Some((binding, &parts[3..]));
            }
        } else if clause.is_call_to("finally") {
            if body_end + i + 1 != clauses.len() {
                return Err(Error::syntax("try", "finally clause must be last").at(clause.loc));
            }
            finally = Some(&parts[1..]);
        } else {
            return Err(Error::syntax(
                "try",
                "only catch or finally clauses may follow catch",
            )
            .at(clause.loc));
        }
    }
    Ok(TryShape {
        body,
        catch,
        finally,
    })
}

/// Name and value form of `(def name value?)`.
pub fn parse_def(form: &Form) -> Result<(&str, Option<&Form>)> {
    let items = list_items(form, "def")?;
    if items.len() < 2 || items.len() > 4 {
        return Err(Error::syntax("def", "expected (def name value?)").at(form.loc));
    }
    let name = symbol_name(&items[1], "def", "name")?;
    // (def name "doc" value)
    let value = match items.len() {
        4 if matches!(items[2].kind, FormKind::Str(_)) => Some(&items[3]),
        4 => {
            return Err(Error::syntax("def", "too many arguments").at(form.loc));
        }
        3 => Some(&items[2]),
        _ => None,
    };
    Ok((name, value))
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct RecurTarget {
    slots: usize,
    variadic: bool,
}

struct Analyzer {
    cursor: SourceLoc,
    max_depth: usize,
    depth: usize,
}

/// Validate an expanded form. `max_depth` bounds form nesting.
pub fn analyze(form: &Form, max_depth: usize) -> Result<()> {
    let mut analyzer = Analyzer {
        cursor: SourceLoc::UNKNOWN,
        max_depth,
        depth: 0,
    };
    analyzer.form(form, None, false)
}

impl Analyzer {
    fn form(&mut self, form: &Form, target: Option<RecurTarget>, tail: bool) -> Result<()> {
        let saved = self.cursor;
        self.cursor = form.loc.or(self.cursor);
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            Err(Error::syntax(
                "form",
                format!("nested deeper than {}", self.max_depth),
            )
            .at(self.cursor))
        } else {
            self.form_inner(form, target, tail)
        };
        self.depth -= 1;
        self.cursor = saved;
        result
    }

    fn all(&mut self, forms: &[Form], target: Option<RecurTarget>) -> Result<()> {
        for f in forms {
            self.form(f, target, false)?;
        }
        Ok(())
    }

    /// A body: the last form is in tail position if the body is.
    fn body(&mut self, forms: &[Form], target: Option<RecurTarget>, tail: bool) -> Result<()> {
        for (i, f) in forms.iter().enumerate() {
            self.form(f, target, tail && i + 1 == forms.len())?;
        }
        Ok(())
    }

    fn err(&self, what: &str, message: impl Into<String>) -> Error {
        Error::syntax(what, message).at(self.cursor)
    }

    fn form_inner(&mut self, form: &Form, target: Option<RecurTarget>, tail: bool) -> Result<()> {
        match &form.kind {
            FormKind::List(items) => {
                let Some(head) = items.first() else {
                    return Ok(());
                };
                match head.as_symbol() {
                    Some(name) if is_special_form(name) => {
                        self.special(name, form, items, target, tail)
                    }
                    _ => self.all(items, target),
                }
            }
            FormKind::Vector(items) | FormKind::Map(items) | FormKind::Set(items) => {
                self.all(items, target)
            }
            _ => Ok(()),
        }
    }

    fn special(
        &mut self,
        name: &str,
        form: &Form,
        items: &[Form],
        target: Option<RecurTarget>,
        tail: bool,
    ) -> Result<()> {
        let argc = items.len() - 1;
        match name {
            "quote" => {
                if argc != 1 {
                    return Err(self.err("quote", format!("expected 1 argument, got {}", argc)));
                }
                Ok(())
            }
            "syntax-quote" => Err(self.err("syntax-quote", "not expanded")),
            "if" => {
                if !(2..=3).contains(&argc) {
                    return Err(self.err("if", format!("expected 2 or 3 arguments, got {}", argc)));
                }
                self.form(&items[1], target, false)?;
                for branch in &items[2..] {
                    self.form(branch, target, tail)?;
                }
                Ok(())
            }
            "do" => self.body(&items[1..], target, tail),
            "let" | "let*" => {
                let bindings = parse_bindings(form, "let")?;
                for (_, init) in &bindings {
                    self.form(init, target, false)?;
                }
                self.body(binding_body(form), target, tail)
            }
            "loop" | "loop*" => {
                let bindings = parse_bindings(form, "loop")?;
                for (_, init) in &bindings {
                    self.form(init, target, false)?;
                }
                let target = Some(RecurTarget {
                    slots: bindings.len(),
                    variadic: false,
                });
                self.body(binding_body(form), target, true)
            }
            "fn" | "fn*" => {
                let shape = parse_fn(form)?;
                self.arities(&shape.arities)
            }
            "defmacro" => {
                let (_, arities) = parse_defmacro(form)?;
                self.arities(&arities)
            }
            "def" => {
                let (def_name, value) = parse_def(form)?;
                if INLINE_OPERATORS.contains(&def_name) {
                    return Err(self.err("def", format!("cannot redefine core operator {}", def_name)));
                }
                if let Some(value) = value {
                    self.form(value, target, false)?;
                }
                Ok(())
            }
            "recur" => {
                let Some(target) = target else {
                    return Err(self.err("recur", "recur outside of loop or fn"));
                };
                if !tail {
                    return Err(self.err("recur", "can only recur from tail position"));
                }
                if argc != target.slots {
                    let message = if target.variadic {
                        format!(
                            "expected {} arguments (rest parameter passed as one), got {}",
                            target.slots, argc
                        )
                    } else {
                        format!("expected {} arguments, got {}", target.slots, argc)
                    };
                    return Err(self.err("recur", message));
                }
                self.all(&items[1..], Some(target))
            }
            "throw" => {
                if argc != 1 {
                    return Err(self.err("throw", format!("expected 1 argument, got {}", argc)));
                }
                self.form(&items[1], target, false)
            }
            "try" => {
                let shape = parse_try(form)?;
                // recur may not cross a try boundary
                self.body(shape.body, None, false)?;
                if let Some((_, handler)) = shape.catch {
                    self.body(handler, None, false)?;
                }
                for clause in &items[1..] {
                    if clause.is_call_to("catch") {
                        let parts = clause.as_list().unwrap_or(&[]);
                        self.all(parts.get(3..).unwrap_or(&[]), None)?;
                    }
                }
                if let Some(cleanup) = shape.finally {
                    self.body(cleanup, None, false)?;
                }
                Ok(())
            }
            "catch" | "finally" => Err(self.err(name, "must appear inside try")),
            _ => self.all(items, target),
        }
    }

    fn arities(&mut self, arities: &[ArityShape<'_>]) -> Result<()> {
        for arity in arities {
            let target = Some(RecurTarget {
                slots: arity.slot_count(),
                variadic: arity.rest.is_some(),
            });
            let saved = self.cursor;
            self.cursor = arity.loc.or(self.cursor);
            let result = self.body(arity.body, target, true);
            self.cursor = saved;
            result?;
        }
        Ok(())
    }
}
