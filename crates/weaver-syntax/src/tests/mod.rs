//! Crate-level tests for weaver-syntax.
