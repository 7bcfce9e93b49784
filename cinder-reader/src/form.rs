// cinder-reader - Source forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Source-annotated syntax nodes produced by the parser.
//!
//! A [`Form`] is immutable once built. Macro expansion never edits a form in
//! place; it produces new forms, carrying over locations where it can.

use std::fmt;

/// A position in source text. Lines and columns are 1-indexed; `0:0` means
/// "no location known".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    /// The unknown location.
    pub const UNKNOWN: SourceLoc = SourceLoc { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// True if this location points at real source (line is non-zero).
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// `self` if known, otherwise `fallback`.
    #[inline]
    pub fn or(self, fallback: SourceLoc) -> SourceLoc {
        if self.is_known() { self } else { fallback }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The syntactic kind of a form, with its children for collection kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Symbol(String),
    Keyword(String),
    List(Vec<Form>),
    Vector(Vec<Form>),
    /// Map literal; children alternate key, value.
    Map(Vec<Form>),
    Set(Vec<Form>),
    /// A runtime object spliced into code by a macro. The payload is a handle
    /// owned by the evaluation context that produced it; the reader never
    /// produces this kind.
    Opaque(u32),
}

/// A parsed syntax node with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub loc: SourceLoc,
}

impl Form {
    pub fn new(kind: FormKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }

    /// A form with no source location.
    pub fn synthetic(kind: FormKind) -> Self {
        Self {
            kind,
            loc: SourceLoc::UNKNOWN,
        }
    }

    pub fn symbol(name: impl Into<String>, loc: SourceLoc) -> Self {
        Self::new(FormKind::Symbol(name.into()), loc)
    }

    pub fn list(items: Vec<Form>, loc: SourceLoc) -> Self {
        Self::new(FormKind::List(items), loc)
    }

    pub fn vector(items: Vec<Form>, loc: SourceLoc) -> Self {
        Self::new(FormKind::Vector(items), loc)
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.loc.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.loc.column
    }

    /// The symbol name, if this form is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            FormKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// The elements of a list form.
    pub fn as_list(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// The elements of a vector form.
    pub fn as_vector(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Children of any collection form, in source order.
    pub fn children(&self) -> &[Form] {
        match &self.kind {
            FormKind::List(items)
            | FormKind::Vector(items)
            | FormKind::Map(items)
            | FormKind::Set(items) => items,
            _ => &[],
        }
    }

    /// If this is a non-empty list whose head is a symbol, return that name.
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Form::as_symbol)
    }

    /// True for a list of the shape `(name ...)`.
    pub fn is_call_to(&self, name: &str) -> bool {
        self.head_symbol() == Some(name)
    }

    /// Human-readable name of the syntax kind.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            FormKind::Nil => "nil",
            FormKind::Bool(_) => "boolean",
            FormKind::Int(_) => "integer",
            FormKind::Float(_) => "float",
            FormKind::Char(_) => "character",
            FormKind::Str(_) => "string",
            FormKind::Symbol(_) => "symbol",
            FormKind::Keyword(_) => "keyword",
            FormKind::List(_) => "list",
            FormKind::Vector(_) => "vector",
            FormKind::Map(_) => "map",
            FormKind::Set(_) => "set",
            FormKind::Opaque(_) => "object",
        }
    }
}

/// Print a float the way the language reader expects to read it back:
/// integral values keep a trailing `.0`, non-finite values use `##` tags.
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        "##NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "##Inf" } else { "##-Inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

/// Write a string literal with escapes.
pub fn write_escaped_str(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Write a character literal (`\a`, `\newline`, ...).
pub fn write_char_literal(f: &mut impl fmt::Write, c: char) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\newline"),
        ' ' => f.write_str("\\space"),
        '\t' => f.write_str("\\tab"),
        '\r' => f.write_str("\\return"),
        '\x08' => f.write_str("\\backspace"),
        '\x0C' => f.write_str("\\formfeed"),
        c => write!(f, "\\{}", c),
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Form], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FormKind::Nil => f.write_str("nil"),
            FormKind::Bool(b) => write!(f, "{}", b),
            FormKind::Int(n) => write!(f, "{}", n),
            FormKind::Float(n) => f.write_str(&format_float(*n)),
            FormKind::Char(c) => write_char_literal(f, *c),
            FormKind::Str(s) => write_escaped_str(f, s),
            FormKind::Symbol(name) => f.write_str(name),
            FormKind::Keyword(name) => write!(f, ":{}", name),
            FormKind::List(items) => write_seq(f, "(", items, ")"),
            FormKind::Vector(items) => write_seq(f, "[", items, "]"),
            FormKind::Map(items) => {
                f.write_str("{")?;
                for (i, pair) in items.chunks(2).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", pair[0])?;
                    if let Some(v) = pair.get(1) {
                        write!(f, " {}", v)?;
                    }
                }
                f.write_str("}")
            }
            FormKind::Set(items) => write_seq(f, "#{", items, "}"),
            FormKind::Opaque(handle) => write!(f, "#<object {}>", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_keep_decimal_point() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(f64::INFINITY), "##Inf");
        assert_eq!(format_float(f64::NAN), "##NaN");
    }

    #[test]
    fn unknown_location_falls_back() {
        let known = SourceLoc::new(3, 7);
        assert_eq!(SourceLoc::UNKNOWN.or(known), known);
        assert_eq!(known.or(SourceLoc::new(1, 1)), known);
    }

    #[test]
    fn display_nested_forms() {
        let loc = SourceLoc::new(1, 1);
        let form = Form::list(
            vec![
                Form::symbol("f", loc),
                Form::vector(vec![Form::new(FormKind::Int(1), loc)], loc),
                Form::new(FormKind::Str("a\"b".into()), loc),
                Form::new(
                    FormKind::Map(vec![
                        Form::new(FormKind::Keyword("k".into()), loc),
                        Form::new(FormKind::Char(' '), loc),
                    ]),
                    loc,
                ),
            ],
            loc,
        );
        assert_eq!(form.to_string(), "(f [1] \"a\\\"b\" {:k \\space})");
    }
}
