// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Control flow opcode handlers: Jump, Call, Return, Closure.

use std::rc::Rc;

use cinder_core::backend::callable_body;
use cinder_core::builtins::call_data;
use cinder_core::{CodeUnit, Context, Error, FnBody, Function, NativeFn, Result, Value};
use cinder_reader::SourceLoc;

use crate::chunk::{Capture, FnProto};
use crate::opcode::OpCode;
use crate::vm::frame::{CallFrame, Entry};
use crate::vm::VM;

/// Remaining host stack below which a nested run moves to a new segment.
const NESTED_RED_ZONE: usize = 128 * 1024;
const NESTED_STACK_GROW: usize = 2 * 1024 * 1024;

/// Result of executing an instruction.
#[derive(Debug)]
pub enum ControlFlow {
    Continue,
    /// The run's outermost frame returned.
    Return(Value),
}

/// What a call needs to do with its operator.
enum Callee {
    Compiled(Rc<FnProto>, Rc<[Value]>),
    Native(NativeFn),
    /// Keywords, maps, sets and vectors.
    Data,
}

fn classify(ctx: &Context, f: Value, site: SourceLoc) -> Result<Callee> {
    match f {
        Value::Fn(_) => match callable_body(ctx, f).map_err(|e| e.or_at(site))? {
            FnBody::Compiled { unit, captures } => {
                let proto = unit
                    .into_any()
                    .downcast::<FnProto>()
                    .map_err(|_| Error::internal("code unit from another backend").at(site))?;
                Ok(Callee::Compiled(proto, captures))
            }
            FnBody::Native(native) => Ok(Callee::Native(native)),
            FnBody::Interpreted(_) => Err(Error::internal(
                "interpreted function called from the bytecode backend",
            )
            .at(site)),
        },
        Value::Keyword(_) | Value::Map(_) | Value::Set(_) | Value::Vector(_) => Ok(Callee::Data),
        other => Err(Error::not_callable(other.type_name()).at(site)),
    }
}

impl VM {
    pub(crate) fn execute_control(
        &mut self,
        ctx: &mut Context,
        op: OpCode,
        entry: &Entry,
    ) -> Result<ControlFlow> {
        match op {
            OpCode::Jump(offset) => {
                if offset < 0 {
                    self.safe_point(ctx);
                }
                self.jump(offset)?;
            }
            OpCode::PopJumpIfFalse(offset) => {
                let test = self.stack.pop()?;
                if !test.is_truthy() {
                    self.jump(offset)?;
                }
            }
            OpCode::Call { argc, site } => {
                self.safe_point(ctx);
                self.call_op(ctx, argc as usize, site)?;
            }
            OpCode::Return => {
                let result = self.stack.pop()?;
                let frame = self.frames.pop().ok_or_else(crate::vm::no_frame)?;
                self.stack.truncate(frame.base);
                if frame.counted {
                    ctx.exit_call();
                }
                if self.frames.len() == entry.frames {
                    return Ok(ControlFlow::Return(result));
                }
                self.stack.push(result);
            }
            OpCode::Closure(index) => self.make_closure(ctx, index, false)?,
            OpCode::Macro(index) => self.make_closure(ctx, index, true)?,
            other => return Err(Error::internal(format!("not a control opcode: {:?}", other))),
        }
        Ok(ControlFlow::Continue)
    }

    /// `Call`: the operator sits `argc` slots below the top.
    fn call_op(&mut self, ctx: &mut Context, argc: usize, site: u16) -> Result<()> {
        let sites = self.get_site(site)?;
        let call_site = sites.first().copied().unwrap_or(SourceLoc::UNKNOWN);
        let callee_index = self
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or_else(|| Error::internal("VM stack underflow"))?;
        let f = self.stack.get(callee_index)?;
        match classify(ctx, f, call_site)? {
            Callee::Compiled(proto, captures) => {
                self.push_frame(ctx, proto, captures, callee_index, argc, call_site)
            }
            Callee::Native(native) => {
                let args = self.stack.split_off(callee_index + 1)?;
                self.stack.pop()?;
                let value = self.with_sources(ctx, &sites, |vm, ctx| {
                    ctx.call_native(vm, &native, &args)
                })?;
                self.stack.push(value);
                Ok(())
            }
            Callee::Data => {
                let args = self.stack.split_off(callee_index + 1)?;
                self.stack.pop()?;
                let value = self.with_sources(ctx, &sites, |_, ctx| call_data(ctx, f, &args))?;
                self.stack.push(value);
                Ok(())
            }
        }
    }

    /// Invoke `f` from outside the bytecode (a built-in or the host).
    pub(crate) fn call_value(
        &mut self,
        ctx: &mut Context,
        f: Value,
        args: &[Value],
        site: SourceLoc,
    ) -> Result<Value> {
        let sites = [site];
        match classify(ctx, f, site)? {
            Callee::Compiled(proto, captures) => {
                let entry = self.entry();
                self.stack.push(f);
                for arg in args {
                    self.stack.push(*arg);
                }
                if let Err(err) = self.push_frame(ctx, proto, captures, entry.stack, args.len(), site) {
                    self.stack.truncate(entry.stack);
                    return Err(err);
                }
                // nested runs recurse on the host stack through the native
                stacker::maybe_grow(NESTED_RED_ZONE, NESTED_STACK_GROW, || self.run(ctx, entry))
            }
            Callee::Native(native) => {
                self.with_sources(ctx, &sites, |vm, ctx| ctx.call_native(vm, &native, args))
            }
            Callee::Data => self.with_sources(ctx, &sites, |_, ctx| call_data(ctx, f, args)),
        }
    }

    /// Enter a compiled function whose operator is at `callee_index` with
    /// its arguments above it.
    fn push_frame(
        &mut self,
        ctx: &mut Context,
        proto: Rc<FnProto>,
        captures: Rc<[Value]>,
        callee_index: usize,
        argc: usize,
        site: SourceLoc,
    ) -> Result<()> {
        let Some(arity) = proto.select_arity(argc) else {
            let name = proto.name.map_or("fn", |sym| ctx.sym_name(sym));
            return Err(Error::arity_spec(name, proto.arity_spec(), argc).or_at(site));
        };
        ctx.enter_call().map_err(|e| e.or_at(site))?;

        let code = &proto.arities[arity];
        if code.has_rest {
            let extras = self.stack.split_off(callee_index + 1 + code.params)?;
            let rest = if extras.is_empty() {
                Ok(Value::Nil)
            } else {
                ctx.list_from(extras)
            };
            match rest {
                Ok(rest) => self.stack.push(rest),
                Err(err) => {
                    ctx.exit_call();
                    return Err(err.or_at(site));
                }
            }
        }

        self.frames.push(CallFrame {
            proto,
            arity,
            ip: 0,
            base: callee_index,
            captures,
            site,
            counted: true,
        });
        Ok(())
    }

    /// Run `f` with the attribution table describing this call (the call
    /// site, then each argument), restoring the caller's table afterwards.
    pub(crate) fn with_sources(
        &mut self,
        ctx: &mut Context,
        sites: &[SourceLoc],
        f: impl FnOnce(&mut Self, &mut Context) -> Result<Value>,
    ) -> Result<Value> {
        let site = sites.first().copied().unwrap_or(SourceLoc::UNKNOWN);
        let saved = ctx.sources.snapshot();
        ctx.sources.begin_call(site);
        for (i, loc) in sites.iter().skip(1).enumerate() {
            ctx.sources.record(i, *loc);
        }
        let result = f(self, ctx).map_err(|e| e.or_at(site));
        ctx.sources.restore(saved);
        result
    }

    fn make_closure(&mut self, ctx: &mut Context, index: u16, is_macro: bool) -> Result<()> {
        let frame = self.frame()?;
        let proto = frame
            .chunk()
            .protos
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::internal(format!("prototype {} out of range", index)))?;
        let mut captured = Vec::with_capacity(proto.captures.len());
        for capture in &proto.captures {
            let value = match *capture {
                Capture::Local(slot) => self.stack.get(frame.base + slot as usize)?,
                Capture::Enclosing(i) => frame
                    .captures
                    .get(i as usize)
                    .copied()
                    .ok_or_else(|| Error::internal(format!("capture {} out of range", i)))?,
            };
            captured.push(value);
        }
        let name = proto.name;
        let unit: Rc<dyn CodeUnit> = proto;
        let value = ctx.alloc_fn(Function {
            name,
            is_macro,
            body: FnBody::Compiled {
                unit,
                captures: Rc::from(captured),
            },
        })?;
        self.stack.push(value);
        Ok(())
    }
}
