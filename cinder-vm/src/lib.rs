// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler and stack-based virtual machine for cinder.
//!
//! This crate provides the second execution backend. Forms are expanded
//! and validated by `cinder-core` exactly as for the tree-walking backend,
//! then compiled to bytecode and run by [`VM`]. Both backends share the
//! heap, the built-ins and the error taxonomy, and report the same values
//! and the same error locations.

pub mod chunk;
pub mod compiler;
pub mod opcode;
pub mod vm;

pub use chunk::{ArityCode, Capture, Chunk, FnProto};
pub use compiler::{CompileError, Compiler};
pub use opcode::OpCode;
pub use vm::VM;
