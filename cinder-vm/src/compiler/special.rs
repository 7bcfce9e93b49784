// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation for special forms. Shapes come from
//! `cinder_core::analyze`, which has already validated them.

use cinder_core::analyze::{self, ArityShape};
use cinder_core::form_to_value;
use cinder_reader::Form;

use super::Compiler;
use super::types::{ArityState, CompileError, FnScope, LoopContext, Result};
use crate::chunk::{ArityCode, FnProto};
use crate::opcode::OpCode;

impl Compiler<'_> {
    pub(super) fn compile_special(&mut self, name: &str, form: &Form, items: &[Form]) -> Result<()> {
        match name {
            "quote" => {
                let value = form_to_value(self.ctx, &items[1])?;
                self.emit_constant(value)
            }
            "if" => self.compile_if(items),
            "do" => self.compile_body(&items[1..]),
            "let" | "let*" => self.compile_let(form, false),
            "loop" | "loop*" => self.compile_let(form, true),
            "recur" => self.compile_recur(&items[1..]),
            "fn" | "fn*" => {
                let shape = analyze::parse_fn(form)?;
                let proto = self.compile_fn(shape.name, &shape.arities)?;
                let index = self.add_proto(proto)?;
                self.emit(OpCode::Closure(index));
                Ok(())
            }
            "def" => {
                let (name, value) = analyze::parse_def(form)?;
                match value {
                    Some(value) => self.compile(value)?,
                    None => {
                        self.emit(OpCode::Nil);
                    }
                }
                self.emit_def(name)
            }
            "defmacro" => {
                let (name, shapes) = analyze::parse_defmacro(form)?;
                let proto = self.compile_fn(Some(name), &shapes)?;
                let index = self.add_proto(proto)?;
                self.emit(OpCode::Macro(index));
                self.emit_def(name)
            }
            "throw" => {
                let depth = self.depth();
                self.compile(&items[1])?;
                self.emit(OpCode::Throw);
                self.set_depth(depth + 1);
                Ok(())
            }
            "try" => self.compile_try(form),
            _ => Err(CompileError::Syntax {
                form: name.to_string(),
                message: "not valid in this position".to_string(),
            }),
        }
    }

    fn emit_def(&mut self, name: &str) -> Result<()> {
        let sym = self.ctx.symbol(name);
        let index = self.arity().chunk.add_constant(sym)?;
        self.emit(OpCode::DefGlobal(index));
        Ok(())
    }

    /// (if test then else?)
    fn compile_if(&mut self, items: &[Form]) -> Result<()> {
        self.compile(&items[1])?;
        let to_else = self.emit_jump(OpCode::PopJumpIfFalse(0));
        let depth = self.depth();
        self.compile(&items[2])?;
        let to_end = self.emit_jump(OpCode::Jump(0));
        self.patch_jump(to_else)?;
        self.set_depth(depth);
        match items.get(3) {
            Some(otherwise) => self.compile(otherwise)?,
            None => {
                self.emit(OpCode::Nil);
            }
        }
        self.patch_jump(to_end)
    }

    /// (let [name init ...] body*) and (loop [name init ...] body*)
    fn compile_let(&mut self, form: &Form, is_loop: bool) -> Result<()> {
        let what = if is_loop { "loop" } else { "let" };
        let bindings = analyze::parse_bindings(form, what)?;
        let locals_before = self.local_count();
        let first_slot = u16::try_from(self.depth()).map_err(|_| CompileError::TooManyLocals)?;
        for (name, init) in &bindings {
            self.compile(init)?;
            self.add_local(name)?;
        }
        let slot_count = u16::try_from(bindings.len()).map_err(|_| CompileError::TooManyLocals)?;

        if is_loop {
            let start_offset = self.arity().chunk.current_offset();
            self.arity().loops.push(LoopContext {
                start_offset,
                first_slot,
                slot_count,
            });
        }
        let result = self.compile_body(analyze::binding_body(form));
        if is_loop {
            self.arity().loops.pop();
        }
        result?;

        self.truncate_locals(locals_before);
        if slot_count > 0 {
            self.emit(OpCode::EndScope(slot_count));
        }
        Ok(())
    }

    /// (recur arg*): overwrite the target's slots, drop anything bound
    /// since, jump back.
    fn compile_recur(&mut self, args: &[Form]) -> Result<()> {
        let Some(target) = self.current.arity.loops.last().copied() else {
            return Err(CompileError::Syntax {
                form: "recur".to_string(),
                message: "recur outside of loop or fn".to_string(),
            });
        };
        let depth = self.depth();
        self.compile_all(args)?;
        for i in (0..args.len() as u16).rev() {
            self.emit(OpCode::StoreLocal(target.first_slot + i));
        }
        let keep = target.first_slot + target.slot_count;
        self.emit(OpCode::Truncate(keep));
        self.set_depth(u32::from(keep));
        self.emit_loop(target.start_offset)?;
        self.set_depth(depth + 1);
        Ok(())
    }

    /// Compile a function's arities into a prototype. The function's name,
    /// if any, refers to the function itself inside its body.
    pub(super) fn compile_fn(&mut self, name: Option<&str>, arities: &[ArityShape<'_>]) -> Result<FnProto> {
        let scope = FnScope::new(name.map(str::to_string));
        let parent = std::mem::replace(&mut self.current, scope);
        self.enclosing.push(parent);

        let result = self.compile_arities(arities);

        let Some(parent) = self.enclosing.pop() else {
            return Err(CompileError::Syntax {
                form: "fn".to_string(),
                message: "unbalanced function scopes".to_string(),
            });
        };
        let scope = std::mem::replace(&mut self.current, parent);
        let arities = result?;
        Ok(FnProto {
            name: name.map(|n| self.ctx.intern(n)),
            display_name: name.map(str::to_string),
            arities,
            captures: scope.captures,
        })
    }

    fn compile_arities(&mut self, shapes: &[ArityShape<'_>]) -> Result<Vec<ArityCode>> {
        let mut arities = Vec::with_capacity(shapes.len());
        for shape in shapes {
            self.current.arity = ArityState::new();
            for param in &shape.params {
                self.declare_local(param)?;
            }
            if let Some(rest) = shape.rest {
                self.declare_local(rest)?;
            }
            let slot_count =
                u16::try_from(shape.slot_count()).map_err(|_| CompileError::TooManyLocals)?;
            self.arity().loops.push(LoopContext {
                start_offset: 0,
                first_slot: 1,
                slot_count,
            });
            self.compile_body(shape.body)?;
            self.emit(OpCode::Return);
            let arity = std::mem::take(&mut self.current.arity);
            arities.push(ArityCode {
                params: shape.params.len(),
                has_rest: shape.rest.is_some(),
                chunk: arity.chunk,
            });
        }
        Ok(arities)
    }

    /// (try body* (catch Class e handler*)? (finally cleanup*)?)
    ///
    /// A finally clause is compiled twice: once on the normal path and once
    /// in the handler that re-raises the pending error.
    fn compile_try(&mut self, form: &Form) -> Result<()> {
        let shape = analyze::parse_try(form)?;
        let depth = self.depth();

        let finally_handler = match shape.finally {
            Some(_) => Some(self.emit_jump(OpCode::PushFinally(0))),
            None => None,
        };

        match shape.catch {
            Some((binding, handler)) => {
                let catch_handler = self.emit_jump(OpCode::PushCatch(0));
                self.compile_body(shape.body)?;
                self.emit(OpCode::PopHandler);
                let to_end = self.emit_jump(OpCode::Jump(0));

                self.patch_jump(catch_handler)?;
                self.set_depth(depth);
                let locals_before = self.local_count();
                self.declare_local(binding)?;
                self.compile_body(handler)?;
                self.truncate_locals(locals_before);
                self.emit(OpCode::EndScope(1));
                self.patch_jump(to_end)?;
            }
            None => self.compile_body(shape.body)?,
        }

        if let (Some(handler), Some(cleanup)) = (finally_handler, shape.finally) {
            self.emit(OpCode::PopHandler);
            self.compile_body(cleanup)?;
            self.emit(OpCode::Pop);
            let to_end = self.emit_jump(OpCode::Jump(0));

            self.patch_jump(handler)?;
            self.set_depth(depth);
            self.compile_body(cleanup)?;
            self.emit(OpCode::Pop);
            self.emit(OpCode::Rethrow);
            self.patch_jump(to_end)?;
            self.set_depth(depth + 1);
        }
        Ok(())
    }
}
