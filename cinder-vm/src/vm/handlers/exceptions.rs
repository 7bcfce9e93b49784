// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! throw, try handlers and error unwinding.

use cinder_core::backend::{caught_value, user_raised};
use cinder_core::{Context, Error, Result};

use crate::opcode::OpCode;
use crate::vm::VM;
use crate::vm::frame::{Entry, Handler, HandlerKind};

impl VM {
    pub(crate) fn execute_exceptions(&mut self, ctx: &mut Context, op: OpCode) -> Result<()> {
        match op {
            OpCode::Throw => {
                let payload = self.stack.pop()?;
                Err(user_raised(ctx, payload).at(self.current_loc()))
            }
            OpCode::PushCatch(offset) => self.push_handler(ctx, HandlerKind::Catch, offset),
            OpCode::PushFinally(offset) => self.push_handler(ctx, HandlerKind::Finally, offset),
            OpCode::PopHandler => {
                self.handlers
                    .pop()
                    .ok_or_else(|| Error::internal("no handler to pop"))?;
                Ok(())
            }
            OpCode::Rethrow => Err(self
                .pending
                .pop()
                .unwrap_or_else(|| Error::internal("rethrow without a pending error"))),
            other => Err(Error::internal(format!("not an exception opcode: {:?}", other))),
        }
    }

    fn push_handler(&mut self, ctx: &Context, kind: HandlerKind, offset: i16) -> Result<()> {
        let ip = self.frame()?.ip;
        let target = usize::try_from(ip as isize + offset as isize)
            .map_err(|_| Error::internal("handler before start of chunk"))?;
        self.handlers.push(Handler {
            kind,
            frames: self.frames.len(),
            target,
            stack: self.stack.len(),
            call_depth: ctx.call_depth(),
            pending: self.pending.len(),
        });
        Ok(())
    }

    /// Route `err` to the innermost handler installed during this run, or
    /// restore the entry state and return it.
    ///
    /// Frames popped on the way attribute a location-less error to their
    /// call site. Fatal errors skip every handler.
    pub(crate) fn unwind(&mut self, ctx: &mut Context, mut err: Error, entry: &Entry) -> Result<()> {
        loop {
            let handler = if !err.is_fatal() && self.handlers.len() > entry.handlers {
                self.handlers.pop()
            } else {
                None
            };
            let Some(handler) = handler else {
                break;
            };

            while self.frames.len() > handler.frames {
                if let Some(frame) = self.frames.pop() {
                    err = err.or_at(frame.site);
                }
            }
            self.stack.truncate(handler.stack);
            self.pending.truncate(handler.pending);
            ctx.set_call_depth(handler.call_depth);

            match handler.kind {
                HandlerKind::Catch => match caught_value(ctx, &err) {
                    Ok(value) => self.stack.push(value),
                    Err(failure) => {
                        err = failure;
                        continue;
                    }
                },
                HandlerKind::Finally => self.pending.push(err),
            }
            self.frame_mut()?.ip = handler.target;
            log::trace!("resumed at handler {:?}", handler.kind);
            return Ok(());
        }

        while self.frames.len() > entry.frames {
            if let Some(frame) = self.frames.pop() {
                err = err.or_at(frame.site);
                if frame.counted {
                    ctx.exit_call();
                }
            }
        }
        self.stack.truncate(entry.stack);
        self.handlers.truncate(entry.handlers);
        self.pending.truncate(entry.pending);
        Err(err)
    }
}
