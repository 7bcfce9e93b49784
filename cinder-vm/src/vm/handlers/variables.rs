// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Constant, stack and variable opcode handlers.

use cinder_core::{Context, Error, Result, Value};

use crate::opcode::OpCode;
use crate::vm::VM;

impl VM {
    pub(crate) fn execute_variables(&mut self, ctx: &mut Context, op: OpCode) -> Result<()> {
        match op {
            OpCode::Const(index) => {
                let value = self.get_constant(index)?;
                self.stack.push(value);
            }
            OpCode::Nil => self.stack.push(Value::Nil),
            OpCode::True => self.stack.push(Value::Bool(true)),
            OpCode::False => self.stack.push(Value::Bool(false)),
            OpCode::Pop => {
                self.stack.pop()?;
            }
            OpCode::EndScope(n) => {
                let result = self.stack.pop()?;
                let len = self.stack.len().saturating_sub(n as usize);
                self.stack.truncate(len);
                self.stack.push(result);
            }
            OpCode::Truncate(n) => {
                let base = self.frame()?.base;
                self.stack.truncate(base + n as usize);
            }
            OpCode::LoadLocal(slot) => {
                let base = self.frame()?.base;
                let value = self.stack.get(base + slot as usize)?;
                self.stack.push(value);
            }
            OpCode::StoreLocal(slot) => {
                let base = self.frame()?.base;
                let value = self.stack.pop()?;
                self.stack.set(base + slot as usize, value)?;
            }
            OpCode::LoadCapture(index) => {
                let value = self
                    .frame()?
                    .captures
                    .get(index as usize)
                    .copied()
                    .ok_or_else(|| Error::internal(format!("capture {} out of range", index)))?;
                self.stack.push(value);
            }
            OpCode::LoadGlobal(index) => {
                let Value::Symbol(sym) = self.get_constant(index)? else {
                    return Err(Error::internal("global name is not a symbol"));
                };
                let value = ctx.lookup_global(sym).ok_or_else(|| {
                    Error::unresolved(ctx.sym_name(sym)).at(self.current_loc())
                })?;
                self.stack.push(value);
            }
            OpCode::DefGlobal(index) => {
                let name = self.get_constant(index)?;
                let Value::Symbol(sym) = name else {
                    return Err(Error::internal("def name is not a symbol"));
                };
                let value = self.stack.pop()?;
                ctx.root_env().define(sym, value);
                self.stack.push(name);
            }
            other => return Err(Error::internal(format!("not a variable opcode: {:?}", other))),
        }
        Ok(())
    }
}
