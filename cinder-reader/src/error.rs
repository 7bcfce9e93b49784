// cinder-reader - Read errors
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use thiserror::Error;

use crate::form::SourceLoc;

/// A lexing or parsing failure, with the position where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {}, column {}", .loc.line, .loc.column)]
pub struct ReadError {
    pub message: String,
    pub loc: SourceLoc,
}

impl ReadError {
    pub fn new(message: impl Into<String>, loc: SourceLoc) -> Self {
        Self {
            message: message.into(),
            loc,
        }
    }
}
