// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Instruction emission, stack depth tracking and name resolution.

use cinder_core::Value;
use cinder_reader::SourceLoc;

use super::Compiler;
use super::types::{ArityState, CompileError, FnScope, Local, Resolved, Result};
use crate::chunk::{Capture, FnProto};
use crate::opcode::OpCode;

impl Compiler<'_> {
    pub(super) fn arity(&mut self) -> &mut ArityState {
        &mut self.current.arity
    }

    /// Emit an instruction at the cursor and track its stack effect.
    pub(super) fn emit(&mut self, op: OpCode) -> usize {
        let loc = self.cursor;
        let arity = self.arity();
        arity.depth = arity.depth.saturating_add_signed(op.stack_effect());
        arity.chunk.emit(op, loc)
    }

    /// Emit a jump with a placeholder offset, to be patched.
    pub(super) fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit(op)
    }

    pub(super) fn patch_jump(&mut self, offset: usize) -> Result<()> {
        self.arity().chunk.patch_jump(offset)
    }

    /// Emit a backward jump to `target`.
    pub(super) fn emit_loop(&mut self, target: usize) -> Result<()> {
        let offset = self.arity().chunk.loop_offset(target)?;
        self.emit(OpCode::Jump(offset));
        Ok(())
    }

    pub(super) fn depth(&self) -> u32 {
        self.current.arity.depth
    }

    /// Reset the tracked depth where control flow merges.
    pub(super) fn set_depth(&mut self, depth: u32) {
        self.arity().depth = depth;
    }

    pub(super) fn emit_constant(&mut self, value: Value) -> Result<()> {
        let index = self.arity().chunk.add_constant(value)?;
        self.emit(OpCode::Const(index));
        Ok(())
    }

    pub(super) fn add_site(&mut self, locs: Vec<SourceLoc>) -> Result<u16> {
        self.arity().chunk.add_site(locs)
    }

    pub(super) fn add_proto(&mut self, proto: FnProto) -> Result<u16> {
        self.arity().chunk.add_proto(proto)
    }

    // ========================================================================
    // Locals
    // ========================================================================

    /// Name the value on top of the stack.
    pub(super) fn add_local(&mut self, name: &str) -> Result<u16> {
        let arity = self.arity();
        let slot = arity.depth.checked_sub(1).ok_or(CompileError::TooManyLocals)?;
        let slot = u16::try_from(slot).map_err(|_| CompileError::TooManyLocals)?;
        arity.locals.push(Local {
            name: name.to_string(),
            slot,
        });
        Ok(slot)
    }

    /// Reserve the next slot for a value the VM places there (parameters,
    /// caught values) and name it.
    pub(super) fn declare_local(&mut self, name: &str) -> Result<u16> {
        self.arity().depth += 1;
        self.add_local(name)
    }

    pub(super) fn local_count(&self) -> usize {
        self.current.arity.locals.len()
    }

    pub(super) fn truncate_locals(&mut self, count: usize) {
        self.arity().locals.truncate(count);
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn scope_at(&mut self, level: usize) -> &mut FnScope {
        if level < self.enclosing.len() {
            &mut self.enclosing[level]
        } else {
            &mut self.current
        }
    }

    /// Resolve a lexical name, capturing it from enclosing functions as
    /// needed. `None` means the name is global.
    pub(super) fn resolve(&mut self, name: &str) -> Result<Option<Resolved>> {
        let level = self.enclosing.len();
        self.resolve_at(level, name)
    }

    fn resolve_at(&mut self, level: usize, name: &str) -> Result<Option<Resolved>> {
        let scope = self.scope_at(level);
        if let Some(slot) = scope.arity.lookup_local(name) {
            return Ok(Some(Resolved::Local(slot)));
        }
        if scope.name.as_deref() == Some(name) {
            return Ok(Some(Resolved::Local(0)));
        }
        if let Some(index) = scope.capture_names.iter().position(|n| n == name) {
            return Ok(Some(Resolved::Capture(index as u16)));
        }
        if level == 0 {
            return Ok(None);
        }
        let capture = match self.resolve_at(level - 1, name)? {
            None => return Ok(None),
            Some(Resolved::Local(slot)) => Capture::Local(slot),
            Some(Resolved::Capture(index)) => Capture::Enclosing(index),
        };
        let scope = self.scope_at(level);
        let index = u16::try_from(scope.captures.len()).map_err(|_| CompileError::TooManyLocals)?;
        scope.captures.push(capture);
        scope.capture_names.push(name.to_string());
        Ok(Some(Resolved::Capture(index)))
    }
}
