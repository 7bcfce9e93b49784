// cinder-embed - Backend conformance harness
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Run a program through both backends and compare the results.
//!
//! Values are compared by their readable printed form. Errors are compared
//! by kind and location; messages are reported but not compared, since the
//! backends word a few internal failures differently.

use std::fmt;

use cinder_core::{ErrorKind, EvalConfig, SourceLoc};

use crate::engine::{BackendKind, Engine};

/// What one backend produced for a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The readable printed value of the last form.
    Value(String),
    Error {
        kind: ErrorKind,
        location: Option<SourceLoc>,
        message: String,
    },
}

impl Outcome {
    /// True if `other` is the same value, or an error of the same kind at
    /// the same location.
    pub fn agrees_with(&self, other: &Outcome) -> bool {
        match (self, other) {
            (Outcome::Value(a), Outcome::Value(b)) => a == b,
            (
                Outcome::Error { kind: k1, location: l1, .. },
                Outcome::Error { kind: k2, location: l2, .. },
            ) => k1 == k2 && l1 == l2,
            _ => false,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Error { kind, .. } => Some(*kind),
            Outcome::Value(_) => None,
        }
    }

    pub fn location(&self) -> Option<SourceLoc> {
        match self {
            Outcome::Error { location, .. } => *location,
            Outcome::Value(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => f.write_str(v),
            Outcome::Error { kind, location: Some(loc), message } => {
                write!(f, "{:?} at {}: {}", kind, loc, message)
            }
            Outcome::Error { kind, location: None, message } => {
                write!(f, "{:?}: {}", kind, message)
            }
        }
    }
}

/// The backends disagreed.
#[derive(Debug, Clone)]
pub struct Divergence {
    pub source: String,
    pub tree_walk: Outcome,
    pub vm: Outcome,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "backends diverge on {:?}\n  tree-walk: {}\n  vm:        {}",
            self.source, self.tree_walk, self.vm
        )
    }
}

impl std::error::Error for Divergence {}

/// Evaluate `setup` then `source` on a fresh engine of `kind`.
///
/// An error from `setup` is the outcome; `source` is not run.
pub fn run_on(kind: BackendKind, config: EvalConfig, setup: &str, source: &str) -> Outcome {
    let mut engine = match Engine::with_config(kind, config) {
        Ok(engine) => engine,
        Err(err) => return error_outcome(err),
    };
    engine.capture_output();
    let result = engine
        .eval(setup)
        .and_then(|_| engine.eval_to_string(source));
    match result {
        Ok(printed) => Outcome::Value(printed),
        Err(err) => error_outcome(err),
    }
}

fn error_outcome(err: cinder_core::Error) -> Outcome {
    Outcome::Error {
        kind: err.kind,
        location: err.location,
        message: err.message,
    }
}

/// Run `source` on both backends with the default configuration.
pub fn run_both(source: &str) -> Result<Outcome, Divergence> {
    run_both_with(EvalConfig::default(), "", source)
}

/// Run `setup` and `source` on both backends, each in a fresh engine.
/// Returns the shared outcome, or both outcomes if they disagree.
pub fn run_both_with(config: EvalConfig, setup: &str, source: &str) -> Result<Outcome, Divergence> {
    let tree_walk = run_on(BackendKind::TreeWalk, config.clone(), setup, source);
    let vm = run_on(BackendKind::Vm, config, setup, source);
    if tree_walk.agrees_with(&vm) {
        log::trace!("backends agree on {:?}: {}", source, tree_walk);
        Ok(tree_walk)
    } else {
        Err(Divergence {
            source: source.to_string(),
            tree_walk,
            vm,
        })
    }
}
