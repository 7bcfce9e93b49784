// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Collection literal handlers.

use cinder_core::{Context, Error, Result};

use crate::opcode::OpCode;
use crate::vm::VM;

impl VM {
    pub(crate) fn execute_collections(&mut self, ctx: &mut Context, op: OpCode) -> Result<()> {
        let value = match op {
            OpCode::BuildList(n) => {
                let items = self.stack.pop_n(n as usize)?;
                ctx.list_from(items)?
            }
            OpCode::BuildVector(n) => {
                let items = self.stack.pop_n(n as usize)?;
                ctx.vector_from(items)?
            }
            OpCode::BuildMap(n) => {
                let items = self.stack.pop_n(n as usize)?;
                let pairs: Vec<_> = items.chunks(2).map(|pair| (pair[0], pair[1])).collect();
                ctx.map_from(pairs)?
            }
            OpCode::BuildSet(n) => {
                let items = self.stack.pop_n(n as usize)?;
                ctx.set_from(items)?
            }
            other => {
                return Err(Error::internal(format!("not a collection opcode: {:?}", other)));
            }
        };
        self.stack.push(value);
        Ok(())
    }
}
