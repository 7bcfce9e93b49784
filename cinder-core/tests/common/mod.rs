// cinder-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for cinder-core integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! - [`eval_str`] - evaluate source in a fresh context, printing the result
//! - [`eval_err`] - evaluate source that must fail, returning the error
//! - [`Session`] - a context and backend shared across several evaluations

#![allow(dead_code)]

pub use cinder_core::{
    Context, Error, ErrorKind, EvalConfig, SourceLoc, TreeWalk, Value, eval_source, new_context,
};

/// A context plus the tree-walk backend that evaluates in it.
pub struct Session {
    pub ctx: Context,
    pub backend: TreeWalk,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let mut backend = TreeWalk::new();
        let ctx = new_context(config, &mut backend).expect("prelude should load");
        Session { ctx, backend }
    }

    pub fn eval(&mut self, src: &str) -> Result<Value, Error> {
        eval_source(&mut self.ctx, &mut self.backend, src)
    }

    /// Evaluate and print the result readably.
    pub fn eval_str(&mut self, src: &str) -> Result<String, Error> {
        let v = self.eval(src)?;
        Ok(self.ctx.repr(v))
    }
}

/// Evaluate `src` in a fresh context and print the result readably.
pub fn eval_str(src: &str) -> Result<String, Error> {
    Session::new().eval_str(src)
}

/// Evaluate `src`, which must fail.
pub fn eval_err(src: &str) -> Error {
    match eval_str(src) {
        Ok(v) => panic!("expected an error for '{}' but got {}", src, v),
        Err(err) => err,
    }
}

/// Assert that `src` evaluates to a value printing as `expected`.
#[macro_export]
macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        match $crate::common::eval_str($input) {
            Ok(printed) => assert_eq!(
                printed, $expected,
                "evaluation of '{}' did not match expected",
                $input
            ),
            Err(err) => panic!("failed to evaluate '{}': {}", $input, err),
        }
    };
}

/// Assert that `src` fails with the given error kind.
#[macro_export]
macro_rules! assert_eval_err {
    ($input:expr, $kind:expr) => {
        let err = $crate::common::eval_err($input);
        assert_eq!(err.kind, $kind, "unexpected error for '{}': {}", $input, err);
    };
}
