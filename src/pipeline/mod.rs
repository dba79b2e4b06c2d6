//! Compilation driver.
//!
//! `Pipeline` runs each unit through type checking, IR lowering and code
//! generation, aggregates diagnostics, and hands the resulting IR text to
//! a `Backend` for optimization and linking.

pub mod backend;
pub mod pipeline;
