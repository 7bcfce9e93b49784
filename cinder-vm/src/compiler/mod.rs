// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler: transforms expanded forms to bytecode.
//!
//! Forms arrive expanded and validated by `cinder_core::analyze`. The
//! compiler resolves names lexically (locals by slot, enclosing locals by
//! captured value, everything else through the root environment) and
//! records a source location for every instruction.
//!
//! The compiler keeps the same location cursor as the tree-walking
//! evaluator: the location of the innermost enclosing form that has one.
//! A call records its own location plus each argument's in the chunk's
//! call-site table, which the VM loads into the attribution table before
//! invoking a built-in.

mod codegen;
mod emit;
mod special;
pub mod types;

use cinder_core::Context;
use cinder_reader::{Form, SourceLoc};

use crate::chunk::{ArityCode, FnProto};
use crate::opcode::OpCode;

pub use types::{CompileError, Result};
use types::FnScope;

/// Compiles top-level forms for one context.
pub struct Compiler<'c> {
    ctx: &'c mut Context,
    /// Functions enclosing the one being compiled, outermost first.
    enclosing: Vec<FnScope>,
    current: FnScope,
    cursor: SourceLoc,
}

impl<'c> Compiler<'c> {
    pub fn new(ctx: &'c mut Context) -> Self {
        Compiler {
            ctx,
            enclosing: Vec::new(),
            current: FnScope::new(None),
            cursor: SourceLoc::UNKNOWN,
        }
    }

    /// Compile a top-level form into a prototype taking no arguments.
    pub fn compile_script(mut self, form: &Form) -> Result<FnProto> {
        self.compile(form)?;
        self.emit(OpCode::Return);
        let arity = std::mem::take(&mut self.current.arity);
        Ok(FnProto {
            name: None,
            display_name: None,
            arities: vec![ArityCode {
                params: 0,
                has_rest: false,
                chunk: arity.chunk,
            }],
            captures: Vec::new(),
        })
    }
}
