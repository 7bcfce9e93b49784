// cinder-core - Runtime and evaluator for the Cinder language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # cinder-core
//!
//! The evaluation engine shared by both Cinder backends: the value model,
//! the heap and its collector, the macro expander, syntax analysis, the
//! built-in functions and the tree-walking backend.
//!
//! The bytecode backend lives in `cinder-vm` and plugs in through the
//! [`Backend`] trait; [`evaluate`] is the single entry point for both.

pub mod analyze;
pub mod attribution;
pub mod backend;
pub mod builtins;
pub mod collections;
pub mod config;
pub mod context;
pub mod env;
pub mod equality;
pub mod error;
pub mod evaluate;
pub mod expander;
pub mod function;
pub mod heap;
pub mod interner;
pub mod numeric;
pub mod printer;
pub mod treewalk;
pub mod value;

pub use attribution::SourceTable;
pub use backend::{Backend, Caller};
pub use builtins::register_builtins;
pub use collections::{PMap, PSet, Seq, ValueKey};
pub use config::EvalConfig;
pub use context::{Context, PinId};
pub use env::Env;
pub use error::{AritySpec, Error, ErrorKind, Result};
pub use evaluate::{eval_source, evaluate, load_prelude, new_context};
pub use expander::{form_to_value, value_to_form};
pub use function::{Closure, CodeUnit, FnArity, FnBody, Function, NativeFn, NativeFnPtr};
pub use heap::{Heap, HeapRef, HeapStats, Tracer};
pub use interner::{Interner, Sym};
pub use treewalk::TreeWalk;
pub use value::{HostObject, Object, Value};

// Re-export reader types for convenience
pub use cinder_reader::{Form, FormKind, ReadError, SourceLoc};
