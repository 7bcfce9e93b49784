// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Stack-based virtual machine for executing cinder bytecode.
//!
//! Calls between compiled functions push frames rather than recursing on
//! the host stack. The machine is reentrant: a built-in that calls back
//! into evaluated code (`map`, `swap!`, macro expansion) starts a nested
//! run on the same stacks, which never unwinds past the point where it
//! began.
//!
//! Collection may run at two kinds of safe point: before a call and on a
//! backward jump. The operand stack, every frame's prototype and captures,
//! and errors held by pending finally clauses are roots.

pub mod frame;
mod handlers;
pub mod stack;

use std::rc::Rc;

use cinder_core::{Backend, Caller, CodeUnit, Context, Error, Result, Value};
use cinder_reader::{Form, SourceLoc};

use crate::chunk::{Chunk, FnProto};
use crate::compiler::Compiler;
use crate::opcode::OpCode;

pub use frame::{CallFrame, Entry, Handler, HandlerKind};
pub use handlers::control::ControlFlow;
pub use stack::ValueStack;

fn no_frame() -> Error {
    Error::internal("no active VM frame")
}

/// The bytecode backend.
#[derive(Debug, Default)]
pub struct VM {
    stack: ValueStack,
    frames: Vec<CallFrame>,
    handlers: Vec<Handler>,
    /// Errors held while finally clauses run.
    pending: Vec<Error>,
}

impl VM {
    pub fn new() -> Self {
        Self {
            stack: ValueStack::new(),
            ..Default::default()
        }
    }

    /// Compile an expanded top-level form without running it.
    pub fn compile(ctx: &mut Context, form: &Form) -> Result<FnProto> {
        Ok(Compiler::new(ctx).compile_script(form)?)
    }

    fn entry(&self) -> Entry {
        Entry {
            frames: self.frames.len(),
            handlers: self.handlers.len(),
            pending: self.pending.len(),
            stack: self.stack.len(),
        }
    }

    /// Run until the frame pushed after `entry` returns.
    fn run(&mut self, ctx: &mut Context, entry: Entry) -> Result<Value> {
        loop {
            match self.step(ctx, &entry) {
                Ok(ControlFlow::Continue) => {}
                Ok(ControlFlow::Return(value)) => return Ok(value),
                Err(err) => self.unwind(ctx, err, &entry)?,
            }
        }
    }

    fn step(&mut self, ctx: &mut Context, entry: &Entry) -> Result<ControlFlow> {
        let op = self.read_op()?;
        match op {
            OpCode::Const(_)
            | OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::Pop
            | OpCode::EndScope(_)
            | OpCode::Truncate(_)
            | OpCode::LoadLocal(_)
            | OpCode::StoreLocal(_)
            | OpCode::LoadCapture(_)
            | OpCode::LoadGlobal(_)
            | OpCode::DefGlobal(_) => self.execute_variables(ctx, op)?,

            OpCode::Jump(_)
            | OpCode::PopJumpIfFalse(_)
            | OpCode::Call { .. }
            | OpCode::Return
            | OpCode::Closure(_)
            | OpCode::Macro(_) => return self.execute_control(ctx, op, entry),

            OpCode::Throw
            | OpCode::PushCatch(_)
            | OpCode::PushFinally(_)
            | OpCode::PopHandler
            | OpCode::Rethrow => self.execute_exceptions(ctx, op)?,

            OpCode::Arith { .. } | OpCode::Compare { .. } => self.execute_arithmetic(ctx, op)?,

            OpCode::BuildList(_)
            | OpCode::BuildVector(_)
            | OpCode::BuildMap(_)
            | OpCode::BuildSet(_) => self.execute_collections(ctx, op)?,
        }
        Ok(ControlFlow::Continue)
    }

    fn read_op(&mut self) -> Result<OpCode> {
        let frame = self.frames.last_mut().ok_or_else(no_frame)?;
        let op = frame
            .chunk()
            .code
            .get(frame.ip)
            .copied()
            .ok_or_else(|| Error::internal("instruction pointer out of range"))?;
        frame.ip += 1;
        Ok(op)
    }

    fn frame(&self) -> Result<&CallFrame> {
        self.frames.last().ok_or_else(no_frame)
    }

    fn frame_mut(&mut self) -> Result<&mut CallFrame> {
        self.frames.last_mut().ok_or_else(no_frame)
    }

    fn current_chunk(&self) -> Result<&Chunk> {
        Ok(self.frame()?.chunk())
    }

    fn current_loc(&self) -> SourceLoc {
        self.frames
            .last()
            .map_or(SourceLoc::UNKNOWN, CallFrame::current_loc)
    }

    fn get_constant(&self, index: u16) -> Result<Value> {
        self.current_chunk()?
            .constants
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::internal(format!("constant {} out of range", index)))
    }

    fn get_site(&self, index: u16) -> Result<Rc<[SourceLoc]>> {
        self.current_chunk()?
            .sites
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::internal(format!("call site {} out of range", index)))
    }

    pub(crate) fn jump(&mut self, offset: i16) -> Result<()> {
        let frame = self.frame_mut()?;
        let target = frame.ip as isize + offset as isize;
        frame.ip = usize::try_from(target).map_err(|_| Error::internal("jump before start of chunk"))?;
        Ok(())
    }

    /// Collect if the context allows it, rooting everything the VM holds.
    fn safe_point(&self, ctx: &mut Context) {
        let stack = &self.stack;
        let frames = &self.frames;
        let pending = &self.pending;
        let collected = ctx.maybe_collect(&mut |tracer| {
            tracer.values(stack.iter());
            for frame in frames {
                frame.proto.trace(tracer);
                tracer.values(frame.captures.iter().copied());
            }
            tracer.values(pending.iter().filter_map(|err| err.payload));
        });
        if collected {
            log::trace!("collected at VM safe point (depth {})", frames.len());
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

impl Caller for VM {
    fn call(&mut self, ctx: &mut Context, f: Value, args: &[Value]) -> Result<Value> {
        let site = ctx.sources.call_site();
        self.call_value(ctx, f, args, site)
    }
}

impl Backend for VM {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn as_caller(&mut self) -> &mut dyn Caller {
        self
    }

    fn eval_form(&mut self, ctx: &mut Context, form: &Form) -> Result<Value> {
        let proto = Self::compile(ctx, form)?;
        log::trace!("compiled {} instructions", proto.arities[0].chunk.code.len());
        let entry = self.entry();
        self.stack.push(Value::Nil);
        self.frames.push(CallFrame {
            proto: Rc::new(proto),
            arity: 0,
            ip: 0,
            base: entry.stack,
            captures: Rc::from(Vec::new()),
            site: SourceLoc::UNKNOWN,
            counted: false,
        });
        self.run(ctx, entry)
    }
}
