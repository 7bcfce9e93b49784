// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode chunks and function prototypes.

use std::any::Any;
use std::rc::Rc;

use cinder_core::{CodeUnit, Sym, Tracer, Value};
use cinder_reader::SourceLoc;

use crate::compiler::CompileError;
use crate::opcode::OpCode;

/// A compiled sequence of instructions with its constants and debug info.
#[derive(Debug, Default)]
pub struct Chunk {
    pub code: Vec<OpCode>,
    pub constants: Vec<Value>,
    /// Source location of each instruction.
    pub lines: Vec<SourceLoc>,
    /// Call-site table: the call location followed by each argument's.
    pub sites: Vec<Rc<[SourceLoc]>>,
    /// Function prototypes instantiated by `Closure` and `Macro`.
    pub protos: Vec<Rc<FnProto>>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and return its offset.
    pub fn emit(&mut self, op: OpCode, loc: SourceLoc) -> usize {
        let offset = self.code.len();
        self.code.push(op);
        self.lines.push(loc);
        offset
    }

    /// Add a constant, reusing an identical one.
    pub fn add_constant(&mut self, value: Value) -> Result<u16, CompileError> {
        if let Some(index) = self.constants.iter().position(|c| c.identical(value)) {
            return Ok(index as u16);
        }
        let index = u16::try_from(self.constants.len()).map_err(|_| CompileError::TooManyConstants)?;
        self.constants.push(value);
        Ok(index)
    }

    pub fn add_site(&mut self, locs: Vec<SourceLoc>) -> Result<u16, CompileError> {
        let index = u16::try_from(self.sites.len()).map_err(|_| CompileError::TooManyConstants)?;
        self.sites.push(Rc::from(locs));
        Ok(index)
    }

    pub fn add_proto(&mut self, proto: FnProto) -> Result<u16, CompileError> {
        let index = u16::try_from(self.protos.len()).map_err(|_| CompileError::TooManyConstants)?;
        self.protos.push(Rc::new(proto));
        Ok(index)
    }

    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Point the jump at `offset` to the next instruction.
    pub fn patch_jump(&mut self, offset: usize) -> Result<(), CompileError> {
        let distance = self.code.len() - offset - 1;
        let distance = i16::try_from(distance).map_err(|_| CompileError::JumpTooFar)?;
        self.code[offset] = self.code[offset].with_offset(distance);
        Ok(())
    }

    /// Relative offset of a backward jump emitted next, landing on `target`.
    pub fn loop_offset(&self, target: usize) -> Result<i16, CompileError> {
        let distance = target as isize - (self.code.len() as isize + 1);
        i16::try_from(distance).map_err(|_| CompileError::JumpTooFar)
    }

    pub fn get_line_info(&self, offset: usize) -> SourceLoc {
        self.lines.get(offset).copied().unwrap_or(SourceLoc::UNKNOWN)
    }

    fn trace(&self, tracer: &mut Tracer) {
        tracer.values(self.constants.iter().copied());
        for proto in &self.protos {
            proto.trace(tracer);
        }
    }

    /// Human-readable listing, one instruction per line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (offset, op) in self.code.iter().enumerate() {
            let loc = self.get_line_info(offset);
            out.push_str(&format!("{:04} {:>7} {:?}\n", offset, loc.to_string(), op));
        }
        out
    }
}

/// How a closure obtains each captured value when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// A slot of the creating frame.
    Local(u16),
    /// A capture of the creating closure.
    Enclosing(u16),
}

/// One arity of a compiled function.
#[derive(Debug)]
pub struct ArityCode {
    pub params: usize,
    pub has_rest: bool,
    pub chunk: Chunk,
}

impl ArityCode {
    pub fn accepts(&self, argc: usize) -> bool {
        if self.has_rest {
            argc >= self.params
        } else {
            argc == self.params
        }
    }

    /// Slots bound on entry: fixed params plus the rest param.
    pub fn slot_count(&self) -> usize {
        self.params + usize::from(self.has_rest)
    }
}

/// A compiled function: one chunk per arity plus its capture layout.
#[derive(Debug)]
pub struct FnProto {
    pub name: Option<Sym>,
    pub display_name: Option<String>,
    pub arities: Vec<ArityCode>,
    pub captures: Vec<Capture>,
}

impl FnProto {
    /// Pick the arity for `argc` arguments: an exact fixed arity wins over a
    /// variadic one.
    pub fn select_arity(&self, argc: usize) -> Option<usize> {
        self.arities
            .iter()
            .position(|a| !a.has_rest && a.params == argc)
            .or_else(|| self.arities.iter().position(|a| a.accepts(argc)))
    }

    pub fn arity_spec(&self) -> cinder_core::AritySpec {
        cinder_core::function::arity_spec_of(self.arities.iter().map(|a| (a.params, a.has_rest)))
    }
}

impl CodeUnit for FnProto {
    fn name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    fn trace(&self, tracer: &mut Tracer) {
        for arity in &self.arities {
            arity.chunk.trace(tracer);
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_deduplicated() {
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Int(7)).unwrap();
        let b = chunk.add_constant(Value::Int(8)).unwrap();
        let c = chunk.add_constant(Value::Int(7)).unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn forward_jump_patching() {
        let mut chunk = Chunk::new();
        let loc = SourceLoc::new(1, 1);
        let jump = chunk.emit(OpCode::PopJumpIfFalse(0), loc);
        chunk.emit(OpCode::Nil, loc);
        chunk.emit(OpCode::Pop, loc);
        chunk.patch_jump(jump).unwrap();
        assert_eq!(chunk.code[jump], OpCode::PopJumpIfFalse(2));
    }

    #[test]
    fn backward_jump_offset() {
        let mut chunk = Chunk::new();
        let loc = SourceLoc::new(1, 1);
        chunk.emit(OpCode::Nil, loc);
        chunk.emit(OpCode::Pop, loc);
        // Jump at offset 2 back to 0: ip after the jump is 3.
        assert_eq!(chunk.loop_offset(0).unwrap(), -3);
    }

    #[test]
    fn arity_selection_prefers_fixed() {
        let arity = |params, has_rest| ArityCode {
            params,
            has_rest,
            chunk: Chunk::new(),
        };
        let proto = FnProto {
            name: None,
            display_name: None,
            arities: vec![arity(1, true), arity(2, false)],
            captures: Vec::new(),
        };
        assert_eq!(proto.select_arity(2), Some(1));
        assert_eq!(proto.select_arity(3), Some(0));
        assert_eq!(proto.select_arity(0), None);
    }
}
