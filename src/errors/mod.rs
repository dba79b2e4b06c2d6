//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - `Error`, a failure with an optional source location
//! - `ErrorImpl`, one variant per distinct failure
//! - `ErrorKind`, the classification reported to callers
//! - `Diagnostic`, the per-declaration record collected by the pipeline

pub mod errors;

#[cfg(test)]
mod tests;
