// cinder-core - Error types for the Cinder evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for Cinder evaluation.
//!
//! Every error is a value carrying a kind, a message, an optional source
//! location and an optional payload (the thrown value for `UserRaised`).

use std::fmt;

use cinder_reader::{ReadError, SourceLoc};

use crate::value::Value;

/// Result type for Cinder evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A symbol with no binding in scope.
    UnresolvedSymbol,
    /// Wrong number of arguments to a function.
    ArityMismatch,
    /// An operand of the wrong kind.
    TypeMismatch,
    /// Division by zero, integer overflow.
    ArithmeticError,
    /// Macro expansion nested past the configured limit.
    MacroExpansionDepthExceeded,
    /// The heap reached its object cap. Fatal to the owning context.
    HeapExhausted,
    /// A registered host function failed.
    HostCallFailure,
    /// Raised by evaluated code with `throw`.
    UserRaised,
    /// Malformed special form or unreadable source.
    InvalidSyntax,
    /// Index outside a collection's bounds.
    IndexOutOfBounds,
    /// Call depth exceeded the configured limit.
    StackOverflow,
    /// Internal invariant violation.
    Internal,
}

impl ErrorKind {
    /// Fatal errors cannot be caught and terminate the evaluation context.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::HeapExhausted)
    }

    /// The keyword name used when an error is bound by `catch`.
    pub fn keyword_name(self) -> &'static str {
        match self {
            ErrorKind::UnresolvedSymbol => "unresolved-symbol",
            ErrorKind::ArityMismatch => "arity-mismatch",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::ArithmeticError => "arithmetic-error",
            ErrorKind::MacroExpansionDepthExceeded => "macro-expansion-depth-exceeded",
            ErrorKind::HeapExhausted => "heap-exhausted",
            ErrorKind::HostCallFailure => "host-call-failure",
            ErrorKind::UserRaised => "user-raised",
            ErrorKind::InvalidSyntax => "invalid-syntax",
            ErrorKind::IndexOutOfBounds => "index-out-of-bounds",
            ErrorKind::StackOverflow => "stack-overflow",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword_name())
    }
}

/// Specification for expected arity.
#[derive(Debug, Clone, Copy)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{}", n),
            AritySpec::AtLeast(n) => write!(f, "at least {}", n),
            AritySpec::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// An evaluation error.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLoc>,
    /// The thrown value for `UserRaised`. Only valid until the next
    /// collection unless the caller pins it.
    pub payload: Option<Value>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) if loc.is_known() => write!(f, "{} (at {})", self.message, loc),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            location: None,
            payload: None,
        }
    }

    /// Attach a location unless one is already set. Unknown locations are
    /// ignored.
    #[must_use]
    pub fn or_at(mut self, loc: SourceLoc) -> Self {
        if self.location.is_none() && loc.is_known() {
            self.location = Some(loc);
        }
        self
    }

    /// Replace the location.
    #[must_use]
    pub fn at(mut self, loc: SourceLoc) -> Self {
        if loc.is_known() {
            self.location = Some(loc);
        }
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// Unable to resolve a symbol.
    pub fn unresolved(name: &str) -> Self {
        Error::new(
            ErrorKind::UnresolvedSymbol,
            format!("Unable to resolve symbol: {}", name),
        )
    }

    /// Create an arity error for exact arity.
    pub fn arity_named(name: &str, expected: usize, got: usize) -> Self {
        Self::arity_spec(name, AritySpec::Exact(expected), got)
    }

    /// Create an arity error for minimum arity.
    pub fn arity_at_least(name: &str, expected: usize, got: usize) -> Self {
        Self::arity_spec(name, AritySpec::AtLeast(expected), got)
    }

    /// Create an arity error for a range of arities.
    pub fn arity_range(name: &str, min: usize, max: usize, got: usize) -> Self {
        Self::arity_spec(name, AritySpec::Range(min, max), got)
    }

    pub fn arity_spec(name: &str, expected: AritySpec, got: usize) -> Self {
        Error::new(
            ErrorKind::ArityMismatch,
            format!(
                "Wrong number of args ({}) passed to {}: expected {}",
                got, name, expected
            ),
        )
    }

    /// Create a type error with context.
    pub fn type_error_in(context: &str, expected: &str, got: &str) -> Self {
        Error::new(
            ErrorKind::TypeMismatch,
            format!("{}: expected {}, got {}", context, expected, got),
        )
    }

    pub fn not_callable(type_name: &str) -> Self {
        Error::new(
            ErrorKind::TypeMismatch,
            format!("Cannot call value of type {}", type_name),
        )
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::ArithmeticError, message)
    }

    /// Create an invalid syntax error for a special form.
    pub fn syntax(form: &str, message: impl Into<String>) -> Self {
        Error::new(
            ErrorKind::InvalidSyntax,
            format!("Invalid '{}' syntax: {}", form, message.into()),
        )
    }

    pub fn index_out_of_bounds(index: i64, length: usize) -> Self {
        Error::new(
            ErrorKind::IndexOutOfBounds,
            format!(
                "Index {} out of bounds for collection of length {}",
                index, length
            ),
        )
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Error::new(
            ErrorKind::StackOverflow,
            format!("Stack overflow: call depth exceeded {}", limit),
        )
    }

    pub fn host(name: &str, message: impl fmt::Display) -> Self {
        Error::new(
            ErrorKind::HostCallFailure,
            format!("Host function {} failed: {}", name, message),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::new(
            ErrorKind::Internal,
            format!("Internal error: {}", message.into()),
        )
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        Error::new(ErrorKind::InvalidSyntax, err.message).at(err.loc)
    }
}
