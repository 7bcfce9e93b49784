// cinder-reader - Parser
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Parser turning tokens into source-annotated [`Form`]s.
//!
//! Reader macros desugar into ordinary list forms located at the reader
//! macro character: `'x` becomes `(quote x)`, `` `x `` becomes
//! `(syntax-quote x)`, `@a` becomes `(deref a)` and `#(...)` becomes an
//! `fn*` form.

use crate::error::ReadError;
use crate::form::{Form, FormKind};
use crate::lexer::{Lexer, Spanned, Token};

/// Deepest collection nesting the parser accepts.
pub const MAX_NESTING: usize = 512;

/// The parser reads forms from source text one at a time.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Result<Self, ReadError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            depth: 0,
        })
    }

    /// Parse the next form. Returns `None` at end of input.
    pub fn parse(&mut self) -> Result<Option<Form>, ReadError> {
        if matches!(self.current.token, Token::Eof) {
            return Ok(None);
        }
        self.parse_form().map(Some)
    }

    /// Parse all remaining forms.
    pub fn parse_all(&mut self) -> Result<Vec<Form>, ReadError> {
        let mut forms = Vec::new();
        while let Some(form) = self.parse()? {
            forms.push(form);
        }
        Ok(forms)
    }

    /// Convenience: parse the first form of a string.
    pub fn parse_str(source: &str) -> Result<Option<Form>, ReadError> {
        Parser::new(source)?.parse()
    }

    // ========================================================================
    // Internal parsing methods
    // ========================================================================

    fn advance(&mut self) -> Result<Spanned, ReadError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, message: String) -> ReadError {
        ReadError::new(message, self.current.loc)
    }

    fn parse_form(&mut self) -> Result<Form, ReadError> {
        let loc = self.current.loc;
        let kind = match &self.current.token {
            Token::Nil => FormKind::Nil,
            Token::True => FormKind::Bool(true),
            Token::False => FormKind::Bool(false),
            Token::Int(n) => FormKind::Int(*n),
            Token::Float(n) => FormKind::Float(*n),
            Token::Char(c) => FormKind::Char(*c),
            Token::String(s) => FormKind::Str(s.clone()),
            Token::Symbol(s) => FormKind::Symbol(s.clone()),
            Token::Keyword(s) => FormKind::Keyword(s.clone()),

            Token::LParen => return self.parse_delimited(Token::RParen, FormKind::List),
            Token::LBracket => return self.parse_delimited(Token::RBracket, FormKind::Vector),
            Token::LBrace => return self.parse_map(),
            Token::Set => return self.parse_delimited(Token::RBrace, FormKind::Set),

            Token::Quote => return self.parse_wrapped("quote"),
            Token::SyntaxQuote => return self.parse_wrapped("syntax-quote"),
            Token::Unquote => return self.parse_wrapped("unquote"),
            Token::UnquoteSplice => return self.parse_wrapped("unquote-splicing"),
            Token::Deref => return self.parse_wrapped("deref"),
            Token::AnonFn => return self.parse_anon_fn(),
            Token::Discard => return self.parse_discard(),

            Token::RParen | Token::RBracket | Token::RBrace => {
                return Err(self.error(format!("Unexpected '{}'", self.current.token)));
            }
            Token::Eof => return Err(self.error("Unexpected end of input".to_string())),
        };
        self.advance()?;
        Ok(Form::new(kind, loc))
    }

    fn enter(&mut self) -> Result<(), ReadError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(format!("Forms nested deeper than {}", MAX_NESTING)));
        }
        Ok(())
    }

    /// Parse forms up to `close`, consuming the opening token first.
    fn parse_items(&mut self, close: &Token) -> Result<Vec<Form>, ReadError> {
        let open_loc = self.current.loc;
        self.enter()?;
        self.advance()?;
        let mut items = Vec::new();
        loop {
            if &self.current.token == close {
                break;
            }
            if matches!(self.current.token, Token::Eof) {
                return Err(ReadError::new(
                    format!("Unterminated form; expected '{}'", close),
                    open_loc,
                ));
            }
            items.push(self.parse_form()?);
        }
        self.advance()?;
        self.depth -= 1;
        Ok(items)
    }

    fn parse_delimited(
        &mut self,
        close: Token,
        build: fn(Vec<Form>) -> FormKind,
    ) -> Result<Form, ReadError> {
        let loc = self.current.loc;
        let items = self.parse_items(&close)?;
        Ok(Form::new(build(items), loc))
    }

    fn parse_map(&mut self) -> Result<Form, ReadError> {
        let loc = self.current.loc;
        let items = self.parse_items(&Token::RBrace)?;
        if items.len() % 2 != 0 {
            return Err(ReadError::new(
                "Map literal must contain an even number of forms",
                loc,
            ));
        }
        Ok(Form::new(FormKind::Map(items), loc))
    }

    fn parse_wrapped(&mut self, name: &str) -> Result<Form, ReadError> {
        let loc = self.current.loc;
        self.advance()?; // consume the reader macro token
        if matches!(self.current.token, Token::Eof) {
            return Err(ReadError::new(
                format!("Expected a form after {}", name),
                loc,
            ));
        }
        let form = self.parse_form()?;
        Ok(Form::list(vec![Form::symbol(name, loc), form], loc))
    }

    fn parse_discard(&mut self) -> Result<Form, ReadError> {
        self.advance()?; // consume #_
        self.parse_form()?;
        self.parse_form()
    }

    fn parse_anon_fn(&mut self) -> Result<Form, ReadError> {
        let loc = self.current.loc;
        let body = self.parse_items(&Token::RParen)?;

        let mut max_arg = 0usize;
        let mut has_rest = false;
        for form in &body {
            find_fn_args(form, &mut max_arg, &mut has_rest);
        }

        let mut params = Vec::new();
        for i in 1..=max_arg {
            params.push(Form::symbol(anon_param(i), loc));
        }
        if has_rest {
            params.push(Form::symbol("&", loc));
            params.push(Form::symbol(ANON_REST, loc));
        }

        let call = Form::list(body.into_iter().map(rename_fn_args).collect(), loc);
        Ok(Form::list(
            vec![Form::symbol("fn*", loc), Form::vector(params, loc), call],
            loc,
        ))
    }
}

const ANON_REST: &str = "rest__auto__";

fn anon_param(n: usize) -> String {
    format!("p{}__auto__", n)
}

fn find_fn_args(form: &Form, max_arg: &mut usize, has_rest: &mut bool) {
    match &form.kind {
        FormKind::Symbol(name) => {
            if name == "%" {
                *max_arg = (*max_arg).max(1);
            } else if name == "%&" {
                *has_rest = true;
            } else if let Some(rest) = name.strip_prefix('%')
                && let Ok(n) = rest.parse::<usize>()
            {
                *max_arg = (*max_arg).max(n);
            }
        }
        _ => {
            for child in form.children() {
                find_fn_args(child, max_arg, has_rest);
            }
        }
    }
}

fn rename_fn_args(form: Form) -> Form {
    let Form { kind, loc } = form;
    let kind = match kind {
        FormKind::Symbol(name) => {
            if name == "%" {
                FormKind::Symbol(anon_param(1))
            } else if name == "%&" {
                FormKind::Symbol(ANON_REST.to_string())
            } else if let Some(n) = name.strip_prefix('%').and_then(|r| r.parse::<usize>().ok()) {
                FormKind::Symbol(anon_param(n))
            } else {
                FormKind::Symbol(name)
            }
        }
        FormKind::List(items) => FormKind::List(items.into_iter().map(rename_fn_args).collect()),
        FormKind::Vector(items) => {
            FormKind::Vector(items.into_iter().map(rename_fn_args).collect())
        }
        FormKind::Map(items) => FormKind::Map(items.into_iter().map(rename_fn_args).collect()),
        FormKind::Set(items) => FormKind::Set(items.into_iter().map(rename_fn_args).collect()),
        other => other,
    };
    Form { kind, loc }
}

/// Read every form in `source`.
pub fn read_all(source: &str) -> Result<Vec<Form>, ReadError> {
    Parser::new(source)?.parse_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SourceLoc;

    fn parse(s: &str) -> Form {
        Parser::parse_str(s).unwrap().unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("42").kind, FormKind::Int(42));
        assert_eq!(parse("nil").kind, FormKind::Nil);
        assert_eq!(parse(":a").kind, FormKind::Keyword("a".into()));
        assert_eq!(parse("\"s\"").kind, FormKind::Str("s".into()));
    }

    #[test]
    fn test_every_node_has_location() {
        let form = parse("(foo\n  [1 2]\n  {:a 3})");
        assert_eq!(form.loc, SourceLoc::new(1, 1));
        let items = form.as_list().unwrap();
        assert_eq!(items[0].loc, SourceLoc::new(1, 2));
        assert_eq!(items[1].loc, SourceLoc::new(2, 3));
        assert_eq!(items[1].children()[1].loc, SourceLoc::new(2, 6));
        assert_eq!(items[2].loc, SourceLoc::new(3, 3));
        assert_eq!(items[2].children()[1].loc, SourceLoc::new(3, 7));
    }

    #[test]
    fn test_quote_desugars_at_quote_char() {
        let form = parse("  'x");
        assert_eq!(form.to_string(), "(quote x)");
        assert_eq!(form.loc, SourceLoc::new(1, 3));
        assert_eq!(form.children()[1].loc, SourceLoc::new(1, 4));
    }

    #[test]
    fn test_anon_fn() {
        let form = parse("#(+ % %2)");
        assert_eq!(
            form.to_string(),
            "(fn* [p1__auto__ p2__auto__] (+ p1__auto__ p2__auto__))"
        );
        let form = parse("#(apply f %&)");
        assert_eq!(
            form.to_string(),
            "(fn* [& rest__auto__] (apply f rest__auto__))"
        );
    }

    #[test]
    fn test_discard() {
        let forms = read_all("#_ (ignored) 1 2").unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].kind, FormKind::Int(1));
    }

    #[test]
    fn test_errors() {
        let err = Parser::parse_str("(1 2").unwrap_err();
        assert_eq!(err.loc, SourceLoc::new(1, 1));
        assert!(err.message.contains("Unterminated"));
        assert!(Parser::parse_str(")").is_err());
        assert!(Parser::parse_str("{:a}").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "(".repeat(MAX_NESTING + 1);
        let err = Parser::parse_str(&deep).unwrap_err();
        assert!(err.message.contains("nested"));
    }

    #[test]
    fn test_end_of_input() {
        let mut parser = Parser::new("  ; just a comment\n").unwrap();
        assert_eq!(parser.parse().unwrap(), None);
    }
}
