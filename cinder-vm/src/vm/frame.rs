// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Call frames and exception handlers.

use std::rc::Rc;

use cinder_core::Value;
use cinder_reader::SourceLoc;

use crate::chunk::{Chunk, FnProto};

/// A call frame on the VM's call stack.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub proto: Rc<FnProto>,
    /// Which of the prototype's arities is running.
    pub arity: usize,
    /// Instruction pointer (index into the arity's code).
    pub ip: usize,
    /// Stack index of slot 0, the function itself.
    pub base: usize,
    pub captures: Rc<[Value]>,
    /// Location of the call that created the frame.
    pub site: SourceLoc,
    /// Whether the frame counts towards the call depth limit.
    pub counted: bool,
}

impl CallFrame {
    pub fn chunk(&self) -> &Chunk {
        &self.proto.arities[self.arity].chunk
    }

    /// Location of the instruction last read.
    pub fn current_loc(&self) -> SourceLoc {
        self.chunk().get_line_info(self.ip.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Push the caught value and run the catch clause.
    Catch,
    /// Hold the error while the finally clause runs, then re-raise it.
    Finally,
}

/// An installed `try` handler and the machine state to restore.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub kind: HandlerKind,
    /// Frame count when installed; the owning frame is the last of these.
    pub frames: usize,
    pub target: usize,
    pub stack: usize,
    pub call_depth: usize,
    pub pending: usize,
}

/// Machine state when a run began. A run never unwinds past it.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub frames: usize,
    pub handlers: usize,
    pub pending: usize,
    pub stack: usize,
}
