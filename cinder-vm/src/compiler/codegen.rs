// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation for literals, names and calls.

use cinder_core::Error;
use cinder_core::analyze::{INLINE_OPERATORS, is_special_form};
use cinder_core::numeric::{ArithOp, CmpOp};
use cinder_reader::{Form, FormKind, SourceLoc};

use super::Compiler;
use super::types::{CompileError, Resolved, Result};
use crate::opcode::OpCode;

fn count(n: usize) -> Result<u16> {
    u16::try_from(n).map_err(|_| CompileError::TooManyConstants)
}

/// The inline instruction for a binary operator.
fn inline_op(name: &str, site: u16) -> Option<OpCode> {
    let op = match name {
        "+" => OpCode::Arith { op: ArithOp::Add, site },
        "-" => OpCode::Arith { op: ArithOp::Sub, site },
        "*" => OpCode::Arith { op: ArithOp::Mul, site },
        "/" => OpCode::Arith { op: ArithOp::Div, site },
        "<" => OpCode::Compare { op: CmpOp::Lt, site },
        ">" => OpCode::Compare { op: CmpOp::Gt, site },
        "<=" => OpCode::Compare { op: CmpOp::Le, site },
        ">=" => OpCode::Compare { op: CmpOp::Ge, site },
        _ => return None,
    };
    Some(op)
}

impl Compiler<'_> {
    /// Compile one form, leaving its value on the stack.
    pub(super) fn compile(&mut self, form: &Form) -> Result<()> {
        let saved = self.cursor;
        self.cursor = form.loc.or(saved);
        let result = self.compile_inner(form);
        self.cursor = saved;
        result
    }

    fn compile_inner(&mut self, form: &Form) -> Result<()> {
        match &form.kind {
            FormKind::Nil => {
                self.emit(OpCode::Nil);
            }
            FormKind::Bool(true) => {
                self.emit(OpCode::True);
            }
            FormKind::Bool(false) => {
                self.emit(OpCode::False);
            }
            FormKind::Int(n) => self.emit_constant(cinder_core::Value::Int(*n))?,
            FormKind::Float(n) => self.emit_constant(cinder_core::Value::Float(*n))?,
            FormKind::Char(c) => self.emit_constant(cinder_core::Value::Char(*c))?,
            FormKind::Str(s) => {
                let value = self.ctx.alloc_str(s)?;
                self.emit_constant(value)?;
            }
            FormKind::Keyword(name) => {
                let value = self.ctx.keyword(name);
                self.emit_constant(value)?;
            }
            FormKind::Symbol(name) => self.compile_symbol(name)?,
            FormKind::Opaque(handle) => {
                let value = self.ctx.embedded(*handle).ok_or_else(|| {
                    Error::internal(format!("unknown embedded object #{}", handle))
                })?;
                self.emit_constant(value)?;
            }
            FormKind::Vector(items) => {
                self.compile_all(items)?;
                self.emit(OpCode::BuildVector(count(items.len())?));
            }
            FormKind::Set(items) => {
                self.compile_all(items)?;
                self.emit(OpCode::BuildSet(count(items.len())?));
            }
            FormKind::Map(items) => {
                self.compile_all(items)?;
                self.emit(OpCode::BuildMap(count(items.len())?));
            }
            FormKind::List(items) => match items.first() {
                None => {
                    self.emit(OpCode::BuildList(0));
                }
                Some(head) => match head.as_symbol() {
                    Some(name) if is_special_form(name) => self.compile_special(name, form, items)?,
                    Some(name) if self.is_inline(name, items.len() - 1)? => {
                        self.compile_inline(name, items)?
                    }
                    _ => self.compile_call(items)?,
                },
            },
        }
        Ok(())
    }

    pub(super) fn compile_all(&mut self, forms: &[Form]) -> Result<()> {
        for form in forms {
            self.compile(form)?;
        }
        Ok(())
    }

    /// A body: every form but the last is evaluated for effect.
    pub(super) fn compile_body(&mut self, forms: &[Form]) -> Result<()> {
        let Some((last, init)) = forms.split_last() else {
            self.emit(OpCode::Nil);
            return Ok(());
        };
        for form in init {
            self.compile(form)?;
            self.emit(OpCode::Pop);
        }
        self.compile(last)
    }

    fn compile_symbol(&mut self, name: &str) -> Result<()> {
        match self.resolve(name)? {
            Some(Resolved::Local(slot)) => {
                self.emit(OpCode::LoadLocal(slot));
            }
            Some(Resolved::Capture(index)) => {
                self.emit(OpCode::LoadCapture(index));
            }
            None => {
                let sym = self.ctx.symbol(name);
                let index = self.arity().chunk.add_constant(sym)?;
                self.emit(OpCode::LoadGlobal(index));
            }
        }
        Ok(())
    }

    /// Locations for a call's site table: the call, then each argument.
    fn site_locs(&self, args: &[Form]) -> Vec<SourceLoc> {
        let site = self.cursor;
        std::iter::once(site)
            .chain(args.iter().map(|arg| arg.loc.or(site)))
            .collect()
    }

    /// `(f arg*)`: operator, then arguments left to right, then call.
    fn compile_call(&mut self, items: &[Form]) -> Result<()> {
        let args = &items[1..];
        let locs = self.site_locs(args);
        self.compile(&items[0])?;
        self.compile_all(args)?;
        let site = self.add_site(locs)?;
        self.emit(OpCode::Call {
            argc: count(args.len())?,
            site,
        });
        Ok(())
    }

    /// A two-operand arithmetic or comparison call whose operator has not
    /// been rebound locally.
    fn is_inline(&mut self, name: &str, argc: usize) -> Result<bool> {
        if argc != 2 || !INLINE_OPERATORS.contains(&name) {
            return Ok(false);
        }
        Ok(self.resolve(name)?.is_none())
    }

    fn compile_inline(&mut self, name: &str, items: &[Form]) -> Result<()> {
        let locs = self.site_locs(&items[1..]);
        self.compile(&items[1])?;
        self.compile(&items[2])?;
        let site = self.add_site(locs)?;
        let op = inline_op(name, site).ok_or_else(|| CompileError::Syntax {
            form: name.to_string(),
            message: "not an inline operator".to_string(),
        })?;
        self.emit(op);
        Ok(())
    }
}
