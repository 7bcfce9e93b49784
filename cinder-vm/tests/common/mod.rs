// cinder-vm - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for cinder-vm integration tests.
//!
//! - [`compile_and_run`] - evaluate source on the VM in a fresh context
//! - [`expect_error`] - evaluate source that must fail, returning the error
//! - [`Session`] - a context and VM shared across several evaluations

#![allow(dead_code)]

pub use cinder_core::{Context, Error, ErrorKind, EvalConfig, SourceLoc, Value, eval_source, new_context};
pub use cinder_vm::VM;

pub struct Session {
    pub ctx: Context,
    pub vm: VM,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let mut vm = VM::new();
        let ctx = new_context(config, &mut vm).expect("prelude should load");
        Session { ctx, vm }
    }

    pub fn eval(&mut self, src: &str) -> Result<Value, Error> {
        eval_source(&mut self.ctx, &mut self.vm, src)
    }

    pub fn eval_str(&mut self, src: &str) -> Result<String, Error> {
        let v = self.eval(src)?;
        Ok(self.ctx.repr(v))
    }
}

/// Evaluate `src` on a fresh VM and print the result readably, or
/// `Error: <message>`.
pub fn compile_and_run(src: &str) -> String {
    match Session::new().eval_str(src) {
        Ok(printed) => printed,
        Err(e) => format!("Error: {}", e),
    }
}

/// Evaluate `src`, which must fail with an error of `kind`.
pub fn expect_error(src: &str, kind: ErrorKind) -> Error {
    match Session::new().eval_str(src) {
        Ok(v) => panic!("expected an error for '{}' but got {}", src, v),
        Err(err) => {
            assert_eq!(err.kind, kind, "unexpected error for '{}': {}", src, err);
            err
        }
    }
}

pub fn loc(line: u32, column: u32) -> Option<SourceLoc> {
    Some(SourceLoc::new(line, column))
}
