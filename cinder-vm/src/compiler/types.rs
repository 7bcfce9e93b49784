// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared types for the bytecode compiler.

use cinder_core::{Error, ErrorKind};

use crate::chunk::{Capture, Chunk};

/// Error during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Too many constants in function")]
    TooManyConstants,
    #[error("Too many local variables")]
    TooManyLocals,
    #[error("Jump distance too large; split the function")]
    JumpTooFar,
    #[error("Syntax error in {form}: {message}")]
    Syntax { form: String, message: String },
    /// A runtime failure while building constants (heap exhaustion).
    #[error(transparent)]
    Eval(#[from] Error),
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Eval(err) => err,
            CompileError::Syntax { form, message } => Error::syntax(&form, message),
            other => Error::new(ErrorKind::InvalidSyntax, other.to_string()),
        }
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// A named stack slot.
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub slot: u16,
}

/// Target of `recur`: where to jump and which slots to overwrite.
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    pub start_offset: usize,
    pub first_slot: u16,
    pub slot_count: u16,
}

/// Compilation state for the arity currently being built.
#[derive(Debug, Default)]
pub struct ArityState {
    pub chunk: Chunk,
    pub locals: Vec<Local>,
    /// Values currently above the frame base, slot 0 included.
    pub depth: u32,
    pub loops: Vec<LoopContext>,
}

impl ArityState {
    /// A fresh arity: slot 0 holds the function itself.
    pub fn new() -> Self {
        ArityState {
            depth: 1,
            ..Default::default()
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<u16> {
        self.locals
            .iter()
            .rev()
            .find(|local| local.name == name)
            .map(|local| local.slot)
    }
}

/// Compilation state for one `fn` form (or the top level).
#[derive(Debug)]
pub struct FnScope {
    pub name: Option<String>,
    pub captures: Vec<Capture>,
    pub capture_names: Vec<String>,
    pub arity: ArityState,
}

impl FnScope {
    pub fn new(name: Option<String>) -> Self {
        FnScope {
            name,
            captures: Vec::new(),
            capture_names: Vec::new(),
            arity: ArityState::new(),
        }
    }
}

/// Where a name lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Local(u16),
    Capture(u16),
}
