//! Typed intermediate representation.
//!
//! Checked declarations are lowered into functions made of basic blocks,
//! each ending in exactly one terminator. Values are single-assignment;
//! variables live in symbols accessed through `Load` and `Assign`.

pub mod builder;
pub mod ir;

#[cfg(test)]
mod tests;
