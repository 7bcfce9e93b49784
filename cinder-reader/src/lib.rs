// cinder-reader - Lexer and parser for the Cinder language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # cinder-reader
//!
//! Lexer and parser for Cinder source text. Produces immutable,
//! source-annotated [`Form`] trees; every node carries the line and column
//! where it starts.

pub mod error;
pub mod form;
pub mod lexer;
pub mod parser;

pub use error::ReadError;
pub use form::{Form, FormKind, SourceLoc, format_float, write_char_literal, write_escaped_str};
pub use lexer::{Lexer, Spanned, Token};
pub use parser::{MAX_NESTING, Parser, read_all};
