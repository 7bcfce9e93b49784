// cinder-embed - Embedding API for Cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # cinder-embed
//!
//! A high-level embedding API for the Cinder language.
//!
//! An [`Engine`] owns one evaluation context and one backend. It handles
//! setup, type conversion and host-function registration, and the
//! [`conformance`] module runs programs through both backends side by side.
//!
//! ## Quick Start
//!
//! ```rust
//! use cinder_embed::{BackendKind, Engine};
//!
//! let mut engine = Engine::new(BackendKind::TreeWalk).unwrap();
//! assert_eq!(engine.eval_to_string("(+ 1 2 3)").unwrap(), "6");
//! ```
//!
//! ## Registering Host Functions
//!
//! ```rust
//! use cinder_embed::{BackendKind, Engine, Error, Value};
//!
//! let mut engine = Engine::new(BackendKind::Vm).unwrap();
//! engine
//!     .register_fn("halve", 1, |_ctx, args| match args[0] {
//!         Value::Int(n) if n % 2 == 0 => Ok(Value::Int(n / 2)),
//!         other => Err(Error::type_error_in("halve", "even integer", other.type_name())),
//!     })
//!     .unwrap();
//! assert_eq!(engine.eval_to_string("(halve 84)").unwrap(), "42");
//! ```

pub mod conformance;
mod convert;
mod diagnostic;
mod engine;

pub use convert::{FromValue, IntoValue, Keyword, from_value, to_value};
pub use diagnostic::render_error;
pub use engine::{BackendKind, Engine};

// Re-export core types for convenience
pub use cinder_core::{Context, Error, ErrorKind, EvalConfig, HeapStats, PinId, Result, Value};
pub use cinder_reader::SourceLoc;
