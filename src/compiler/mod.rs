//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that transforms
//! a lowered compilation unit into LLVM IR text. It handles:
//!
//! - Type conversion from language types to LLVM types
//! - One LLVM function per IR function, one LLVM block per IR block
//! - Instructions, terminators and the `print` built-in

pub mod builtins;
pub mod compiler;
pub mod instructions;
pub mod terminators;

#[cfg(test)]
mod tests;
