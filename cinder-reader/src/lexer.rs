// cinder-reader - Lexer
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexer (tokeniser) for cinder source code.
//!
//! Converts a source string into a stream of tokens, each stamped with the
//! line and column of its first character.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::ReadError;
use crate::form::SourceLoc;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Reader macros
    Quote,         // '
    SyntaxQuote,   // `
    Unquote,       // ~
    UnquoteSplice, // ~@
    Deref,         // @
    AnonFn,        // #(
    Set,           // #{
    Discard,       // #_

    // Literals
    Nil,
    True,
    False,
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
    Symbol(String),
    Keyword(String),

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Quote => write!(f, "'"),
            Token::SyntaxQuote => write!(f, "`"),
            Token::Unquote => write!(f, "~"),
            Token::UnquoteSplice => write!(f, "~@"),
            Token::Deref => write!(f, "@"),
            Token::AnonFn => write!(f, "#("),
            Token::Set => write!(f, "#{{"),
            Token::Discard => write!(f, "#_"),
            Token::Nil => write!(f, "nil"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Int(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::Char(c) => write!(f, "\\{}", c),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Symbol(s) => write!(f, "{}", s),
            Token::Keyword(s) => write!(f, ":{}", s),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub loc: SourceLoc,
}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Spanned, ReadError> {
        self.skip_whitespace_and_comments();
        let loc = SourceLoc::new(self.line, self.column);
        let token = self.read_token()?;
        Ok(Spanned { token, loc })
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ReadError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            if matches!(spanned.token, Token::Eof) {
                break;
            }
            tokens.push(spanned.token);
        }
        Ok(tokens)
    }

    fn read_token(&mut self) -> Result<Token, ReadError> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),

            '\'' => self.single(Token::Quote),
            '`' => self.single(Token::SyntaxQuote),
            '~' => {
                self.advance();
                if self.peek() == Some('@') {
                    self.advance();
                    Ok(Token::UnquoteSplice)
                } else {
                    Ok(Token::Unquote)
                }
            }
            '@' => self.single(Token::Deref),

            '#' => self.read_dispatch(),
            '"' => self.read_string(),
            '\\' => self.read_char(),
            ':' => self.read_keyword(),
            '-' | '+' => self.read_number_or_symbol(),
            '0'..='9' => self.read_number(),
            _ if is_symbol_start(c) => self.read_symbol(),

            _ => Err(self.error(format!("Unexpected character: '{}'", c))),
        }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn single(&mut self, token: Token) -> Result<Token, ReadError> {
        self.advance();
        Ok(token)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn error(&self, message: String) -> ReadError {
        ReadError::new(message, SourceLoc::new(self.line, self.column))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_dispatch(&mut self) -> Result<Token, ReadError> {
        self.advance(); // consume #

        match self.peek() {
            Some('(') => self.single(Token::AnonFn),
            Some('{') => self.single(Token::Set),
            Some('_') => self.single(Token::Discard),
            Some('#') => {
                self.advance();
                self.read_special_float()
            }
            Some(c) => Err(self.error(format!("Unknown dispatch macro: #{}", c))),
            None => Err(self.error("Unexpected end of input after #".to_string())),
        }
    }

    fn read_special_float(&mut self) -> Result<Token, ReadError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_symbol_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "Inf" => Ok(Token::Float(f64::INFINITY)),
            "-Inf" => Ok(Token::Float(f64::NEG_INFINITY)),
            "NaN" => Ok(Token::Float(f64::NAN)),
            _ => Err(self.error(format!("Unknown special value: ##{}", name))),
        }
    }

    fn read_string(&mut self) -> Result<Token, ReadError> {
        self.advance(); // consume opening "
        let mut s = String::new();

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('u') => {
                        let code = self.read_unicode_escape()?;
                        s.push(code);
                    }
                    Some(c) => return Err(self.error(format!("Unknown escape sequence: \\{}", c))),
                    None => return Err(self.error("Unterminated string escape".to_string())),
                },
                Some(c) => s.push(c),
                None => return Err(self.error("Unterminated string".to_string())),
            }
        }

        Ok(Token::String(s))
    }

    fn read_unicode_escape(&mut self) -> Result<char, ReadError> {
        let mut hex = String::with_capacity(4);
        for _ in 0..4 {
            match self.advance() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                Some(c) => {
                    return Err(self.error(format!("Invalid hex digit in unicode escape: {}", c)));
                }
                None => return Err(self.error("Unterminated unicode escape".to_string())),
            }
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| self.error("Invalid unicode escape".to_string()))?;
        char::from_u32(code)
            .ok_or_else(|| self.error(format!("Invalid unicode code point: {}", code)))
    }

    fn read_char(&mut self) -> Result<Token, ReadError> {
        self.advance(); // consume backslash

        let first = self
            .advance()
            .ok_or_else(|| self.error("Expected character after \\".to_string()))?;

        if !first.is_ascii_alphabetic() {
            return Ok(Token::Char(first));
        }

        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "newline" => Ok(Token::Char('\n')),
            "space" => Ok(Token::Char(' ')),
            "tab" => Ok(Token::Char('\t')),
            "return" => Ok(Token::Char('\r')),
            "backspace" => Ok(Token::Char('\x08')),
            "formfeed" => Ok(Token::Char('\x0C')),
            _ if name.len() == 1 => Ok(Token::Char(first)),
            s if s.starts_with('u') && s.len() == 5 => {
                let code = u32::from_str_radix(&s[1..], 16)
                    .map_err(|_| self.error(format!("Invalid unicode escape: \\{}", s)))?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| self.error(format!("Invalid unicode code point: {}", code)))?;
                Ok(Token::Char(ch))
            }
            _ => Err(self.error(format!("Unknown character name: \\{}", name))),
        }
    }

    fn read_keyword(&mut self) -> Result<Token, ReadError> {
        self.advance(); // consume :

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_symbol_char(c) || c == ':' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return Err(self.error("Expected keyword name after :".to_string()));
        }

        Ok(Token::Keyword(name))
    }

    fn read_symbol(&mut self) -> Result<Token, ReadError> {
        let mut name = String::new();
        self.collect_symbol_chars(&mut name);

        match name.as_str() {
            "nil" => Ok(Token::Nil),
            "true" => Ok(Token::True),
            "false" => Ok(Token::False),
            _ => Ok(Token::Symbol(name)),
        }
    }

    fn collect_symbol_chars(&mut self, name: &mut String) {
        while let Some(c) = self.peek() {
            if is_symbol_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number_or_symbol(&mut self) -> Result<Token, ReadError> {
        let sign = match self.advance() {
            Some(c) => c,
            None => return Err(self.error("Unexpected end of input".to_string())),
        };

        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let mut s = String::new();
                s.push(sign);
                self.collect_number_chars(&mut s);
                self.parse_number(&s)
            }
            _ => {
                // `+`, `-`, `->`, `->>` and friends
                let mut name = String::new();
                name.push(sign);
                self.collect_symbol_chars(&mut name);
                Ok(Token::Symbol(name))
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, ReadError> {
        let mut s = String::new();
        self.collect_number_chars(&mut s);
        self.parse_number(&s)
    }

    fn collect_number_chars(&mut self, s: &mut String) {
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && (s.ends_with('e') || s.ends_with('E'));
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn parse_number(&self, s: &str) -> Result<Token, ReadError> {
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        if let Some(hex) = unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
        {
            let n = i64::from_str_radix(hex, 16)
                .map_err(|_| self.error(format!("Invalid number: {}", s)))?;
            return Ok(Token::Int(if negative { -n } else { n }));
        }

        if unsigned.contains(['.', 'e', 'E']) {
            let n: f64 = s
                .parse()
                .map_err(|_| self.error(format!("Invalid number: {}", s)))?;
            return Ok(Token::Float(n));
        }

        // Parse with the sign attached so i64::MIN reads correctly.
        s.parse::<i64>()
            .map(Token::Int)
            .map_err(|e| match e.kind() {
                std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                    self.error(format!("Integer literal out of range: {}", s))
                }
                _ => self.error(format!("Invalid number: {}", s)),
            })
    }
}

/// Check if a character can start a symbol.
fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic()
        || matches!(
            c,
            '!' | '$' | '%' | '&' | '*' | '+' | '-' | '.' | '/' | '<' | '=' | '>' | '?' | '_'
        )
}

/// Check if a character can appear in a symbol.
fn is_symbol_char(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit() || c == '\'' || c == '#'
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(s: &str) -> Result<Vec<Token>, ReadError> {
        Lexer::new(s).tokenize()
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            tokenize("()[]{}").unwrap(),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_reader_macros() {
        assert_eq!(
            tokenize("' ` ~ ~@ @ #( #{ #_").unwrap(),
            vec![
                Token::Quote,
                Token::SyntaxQuote,
                Token::Unquote,
                Token::UnquoteSplice,
                Token::Deref,
                Token::AnonFn,
                Token::Set,
                Token::Discard,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("42 -7 +3 0x1F 1.5 -2e3 1e-2").unwrap(),
            vec![
                Token::Int(42),
                Token::Int(-7),
                Token::Int(3),
                Token::Int(31),
                Token::Float(1.5),
                Token::Float(-2000.0),
                Token::Float(0.01),
            ]
        );
        assert_eq!(
            tokenize("-9223372036854775808").unwrap(),
            vec![Token::Int(i64::MIN)]
        );
        assert!(tokenize("99999999999999999999").is_err());
    }

    #[test]
    fn test_symbols_and_keywords() {
        assert_eq!(
            tokenize("foo -> ->> - x# :kw nil true").unwrap(),
            vec![
                Token::Symbol("foo".into()),
                Token::Symbol("->".into()),
                Token::Symbol("->>".into()),
                Token::Symbol("-".into()),
                Token::Symbol("x#".into()),
                Token::Keyword("kw".into()),
                Token::Nil,
                Token::True,
            ]
        );
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(
            tokenize(r#""a\nb" \a \newline \λ"#).unwrap(),
            vec![
                Token::String("a\nb".into()),
                Token::Char('a'),
                Token::Char('\n'),
                Token::Char('λ'),
            ]
        );
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn test_positions_skip_whitespace_and_comments() {
        let mut lexer = Lexer::new("; comment\n  (+ 1\n   22)");
        let open = lexer.next_token().unwrap();
        assert_eq!(open.loc, SourceLoc::new(2, 3));
        let plus = lexer.next_token().unwrap();
        assert_eq!(plus.loc, SourceLoc::new(2, 4));
        let _one = lexer.next_token().unwrap();
        let twenty_two = lexer.next_token().unwrap();
        assert_eq!(twenty_two.token, Token::Int(22));
        assert_eq!(twenty_two.loc, SourceLoc::new(3, 4));
    }
}
