// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction set.
//!
//! Slots are numbered from the frame base: slot 0 holds the function being
//! run, parameters follow, then `let` locals and temporaries. Jump offsets
//! are relative to the instruction after the jump.

use cinder_core::numeric::{ArithOp, CmpOp};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    // ========================================================================
    // Constants and stack
    // ========================================================================
    /// Push constant at index.
    Const(u16),
    Nil,
    True,
    False,
    Pop,
    /// Pop the top value, drop `n` values beneath it, push it back.
    EndScope(u16),
    /// Cut the stack back to `n` slots above the frame base.
    Truncate(u16),

    // ========================================================================
    // Variables
    // ========================================================================
    LoadLocal(u16),
    /// Pop into a slot.
    StoreLocal(u16),
    LoadCapture(u16),
    /// Push the root binding of the symbol constant at index.
    LoadGlobal(u16),
    /// Pop a value, bind it at root, push the symbol constant.
    DefGlobal(u16),

    // ========================================================================
    // Control flow
    // ========================================================================
    Jump(i16),
    PopJumpIfFalse(i16),
    /// Call the function `argc` slots below the top. `site` indexes the
    /// chunk's call-site table.
    Call { argc: u16, site: u16 },
    Return,
    /// Raise the popped value.
    Throw,
    /// Install a handler that binds the caught value and resumes at the
    /// target.
    PushCatch(i16),
    /// Install a handler that holds the error while cleanup runs at the
    /// target.
    PushFinally(i16),
    PopHandler,
    /// Re-raise the error held by the innermost finally handler.
    Rethrow,

    // ========================================================================
    // Functions
    // ========================================================================
    /// Instantiate the nested prototype at index, capturing values.
    Closure(u16),
    /// As `Closure`, flagged as a macro.
    Macro(u16),

    // ========================================================================
    // Inline operators
    // ========================================================================
    Arith { op: ArithOp, site: u16 },
    Compare { op: CmpOp, site: u16 },

    // ========================================================================
    // Literals
    // ========================================================================
    BuildList(u16),
    BuildVector(u16),
    /// Build a map from `n` values (alternating keys and values).
    BuildMap(u16),
    BuildSet(u16),
}

impl OpCode {
    /// Returns true if this instruction can change the instruction pointer.
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            OpCode::Jump(_)
                | OpCode::PopJumpIfFalse(_)
                | OpCode::Call { .. }
                | OpCode::Return
                | OpCode::Throw
                | OpCode::Rethrow
        )
    }

    /// Net change in stack height. `Truncate` is handled by the compiler.
    pub fn stack_effect(&self) -> i32 {
        match self {
            OpCode::Const(_)
            | OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::LoadLocal(_)
            | OpCode::LoadCapture(_)
            | OpCode::LoadGlobal(_)
            | OpCode::Closure(_)
            | OpCode::Macro(_) => 1,

            OpCode::Pop
            | OpCode::StoreLocal(_)
            | OpCode::PopJumpIfFalse(_)
            | OpCode::Return
            | OpCode::Throw
            | OpCode::Arith { .. }
            | OpCode::Compare { .. } => -1,

            OpCode::EndScope(n) => -(*n as i32),
            OpCode::Call { argc, .. } => -(*argc as i32),
            OpCode::BuildList(n)
            | OpCode::BuildVector(n)
            | OpCode::BuildMap(n)
            | OpCode::BuildSet(n) => 1 - *n as i32,

            OpCode::Truncate(_)
            | OpCode::DefGlobal(_)
            | OpCode::Jump(_)
            | OpCode::PushCatch(_)
            | OpCode::PushFinally(_)
            | OpCode::PopHandler
            | OpCode::Rethrow => 0,
        }
    }

    /// Replace the offset of a jump or handler instruction.
    pub(crate) fn with_offset(self, offset: i16) -> Self {
        match self {
            OpCode::Jump(_) => OpCode::Jump(offset),
            OpCode::PopJumpIfFalse(_) => OpCode::PopJumpIfFalse(offset),
            OpCode::PushCatch(_) => OpCode::PushCatch(offset),
            OpCode::PushFinally(_) => OpCode::PushFinally(offset),
            other => other,
        }
    }
}
