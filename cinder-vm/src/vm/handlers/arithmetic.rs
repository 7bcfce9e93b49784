// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Inline arithmetic and comparison.
//!
//! These run the same numeric kernel as the variadic built-ins and report
//! faults the same way: the instruction's call-site entry is loaded into
//! the context's attribution table and the fault is resolved against it.

use cinder_core::numeric;
use cinder_core::{Context, Error, Result, Value};

use crate::opcode::OpCode;
use crate::vm::VM;

impl VM {
    pub(crate) fn execute_arithmetic(&mut self, ctx: &mut Context, op: OpCode) -> Result<()> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        let result = match op {
            OpCode::Arith { op, site } => {
                let sites = self.get_site(site)?;
                self.with_sources(ctx, &sites, |_, ctx| {
                    numeric::arith(op, a, b).map_err(|fault| fault.into_error(ctx, 0))
                })?
            }
            OpCode::Compare { op, site } => {
                let sites = self.get_site(site)?;
                self.with_sources(ctx, &sites, |_, ctx| {
                    numeric::compare(op, a, b)
                        .map(Value::Bool)
                        .map_err(|fault| fault.into_error(ctx, 0))
                })?
            }
            other => {
                return Err(Error::internal(format!("not an arithmetic opcode: {:?}", other)));
            }
        };
        self.stack.push(result);
        Ok(())
    }
}
