// cinder-core - Argument source attribution
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Positional side table of argument source locations.
//!
//! Immediately before a built-in or inline operator runs, the active backend
//! records the call site and the location of each argument. When the
//! built-in fails it asks for the slot of the offending argument, so the
//! error points at that argument rather than at the enclosing call.

use cinder_reader::SourceLoc;

/// Number of argument positions tracked. Later arguments fall back to the
/// call site.
pub const MAX_TRACKED_ARGS: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceTable {
    slots: [SourceLoc; MAX_TRACKED_ARGS],
    call_site: SourceLoc,
}

/// Saved table contents, restored after a nested invocation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSnapshot(SourceTable);

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new invocation at `site`, clearing every argument slot.
    pub fn begin_call(&mut self, site: SourceLoc) {
        self.slots = [SourceLoc::UNKNOWN; MAX_TRACKED_ARGS];
        self.call_site = site;
    }

    /// Overwrite the slot for argument `index`. Out-of-range indices are
    /// ignored.
    pub fn record(&mut self, index: usize, loc: SourceLoc) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = loc;
        }
    }

    /// Location of argument `index`, or the call site if none was recorded.
    pub fn lookup(&self, index: usize) -> SourceLoc {
        match self.slots.get(index) {
            Some(loc) if loc.is_known() => *loc,
            _ => self.call_site,
        }
    }

    pub fn call_site(&self) -> SourceLoc {
        self.call_site
    }

    pub fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot(*self)
    }

    pub fn restore(&mut self, snapshot: SourceSnapshot) {
        *self = snapshot.0;
    }
}
