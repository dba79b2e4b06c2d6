//! Type checking and semantic analysis module.
//!
//! This module turns a parsed `Program` into typed declarations while:
//!
//! - Resolving every name to the `Symbol` it refers to
//! - Checking operands, arguments and return values against annotations
//! - Assigning each variable a storage slot in its function
//!
//! Errors are isolated per declaration: one failing function produces one
//! diagnostic and does not stop its siblings from being checked.

pub mod environment;
pub mod type_checker;
pub mod typed_ast;
