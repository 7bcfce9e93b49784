// cinder-core - Evaluation configuration
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Per-context evaluation limits and collector tuning.

/// Default nested call depth before `StackOverflow`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1_000;

/// Default form nesting accepted by analysis.
pub const DEFAULT_MAX_FORM_DEPTH: usize = 512;

/// Default nested macro expansion depth.
pub const DEFAULT_MAX_MACRO_DEPTH: usize = 256;

/// Default allocations between collections.
pub const DEFAULT_GC_THRESHOLD: usize = 4_096;

/// Default live object cap.
pub const DEFAULT_MAX_HEAP_OBJECTS: usize = 4_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    pub max_call_depth: usize,
    pub max_form_depth: usize,
    pub max_macro_depth: usize,
    pub gc_threshold: usize,
    pub max_heap_objects: usize,
    /// Collect at every safe point.
    pub stress_gc: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_form_depth: DEFAULT_MAX_FORM_DEPTH,
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_heap_objects: DEFAULT_MAX_HEAP_OBJECTS,
            stress_gc: false,
        }
    }
}

impl EvalConfig {
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_macro_depth(mut self, depth: usize) -> Self {
        self.max_macro_depth = depth;
        self
    }

    #[must_use]
    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold.max(1);
        self
    }

    #[must_use]
    pub fn with_max_heap_objects(mut self, max: usize) -> Self {
        self.max_heap_objects = max;
        self
    }

    #[must_use]
    pub fn with_stress_gc(mut self, stress: bool) -> Self {
        self.stress_gc = stress;
        self
    }
}
