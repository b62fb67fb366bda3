//! Crate-level tests for weaver-template.

mod unit;
