// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Opcode handlers, grouped by concern.

pub mod arithmetic;
pub mod collections;
pub mod control;
pub mod exceptions;
pub mod variables;
