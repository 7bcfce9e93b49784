// cinder-vm - Bytecode compiler and virtual machine for cinder
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Value stack for the VM.

use cinder_core::{Error, Result, Value};

fn underflow() -> Error {
    Error::internal("VM stack underflow")
}

/// The VM's value stack.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self {
            values: Vec::with_capacity(256),
        }
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Value> {
        self.values.pop().ok_or_else(underflow)
    }

    /// `distance` is the offset from the top (0 = top).
    #[inline]
    pub fn peek(&self, distance: usize) -> Result<Value> {
        if distance >= self.values.len() {
            return Err(underflow());
        }
        Ok(self.values[self.values.len() - 1 - distance])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<Value> {
        self.values.get(index).copied().ok_or_else(underflow)
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(underflow()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Remove and return everything from `index` up.
    pub fn split_off(&mut self, index: usize) -> Result<Vec<Value>> {
        if index > self.values.len() {
            return Err(underflow());
        }
        Ok(self.values.split_off(index))
    }

    /// Pop the top `n` values, bottom first.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>> {
        let index = self.values.len().checked_sub(n).ok_or_else(underflow)?;
        self.split_off(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.iter().copied()
    }
}
