// cinder-embed - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for cinder-embed integration tests.
//!
//! - [`eval_both`] - run source on both backends, failing on divergence
//! - [`engines`] - one fresh engine per backend
//! - [`assert_both!`] / [`assert_both_err!`] - conformance assertions

#![allow(dead_code)]

pub use cinder_embed::conformance::{Outcome, run_both, run_both_with};
pub use cinder_embed::{
    BackendKind, Engine, Error, ErrorKind, EvalConfig, SourceLoc, Value, from_value,
};

/// Run `src` on both backends and return the shared outcome.
pub fn eval_both(src: &str) -> Outcome {
    match run_both(src) {
        Ok(outcome) => outcome,
        Err(divergence) => panic!("{}", divergence),
    }
}

/// Run `setup` then `src` on both backends under `config`.
pub fn eval_both_with(config: EvalConfig, setup: &str, src: &str) -> Outcome {
    match run_both_with(config, setup, src) {
        Ok(outcome) => outcome,
        Err(divergence) => panic!("{}", divergence),
    }
}

/// A fresh engine for each backend.
pub fn engines() -> Vec<Engine> {
    BackendKind::ALL
        .iter()
        .map(|&kind| Engine::new(kind).expect("engine should start"))
        .collect()
}

pub fn loc(line: u32, column: u32) -> Option<SourceLoc> {
    Some(SourceLoc::new(line, column))
}

/// Assert that both backends print `src`'s value as `expected`.
#[macro_export]
macro_rules! assert_both {
    ($input:expr, $expected:expr) => {
        match $crate::common::eval_both($input) {
            $crate::common::Outcome::Value(printed) => assert_eq!(
                printed, $expected,
                "evaluation of '{}' did not match expected",
                $input
            ),
            other => panic!("failed to evaluate '{}': {}", $input, other),
        }
    };
}

/// Assert that both backends fail on `src` with `kind` at `line:column`.
#[macro_export]
macro_rules! assert_both_err {
    ($input:expr, $kind:expr, $line:expr, $column:expr) => {
        let outcome = $crate::common::eval_both($input);
        assert_eq!(outcome.error_kind(), Some($kind), "unexpected outcome for '{}': {}", $input, outcome);
        assert_eq!(outcome.location(), $crate::common::loc($line, $column), "wrong location for '{}'", $input);
    };
}
