use std::sync::Arc;

use super::statements::{FnDeclStmt, Stmt};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub file: Arc<String>,
}

impl Program {
    pub fn new(body: Vec<Stmt>, file: Arc<String>) -> Self {
        Program { body, file }
    }

    /// Top-level function definitions, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FnDeclStmt> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::FnDecl(function) => Some(function),
            _ => None,
        })
    }

    /// Whether anything other than `def` appears at module level.
    pub fn has_top_level_statements(&self) -> bool {
        self.body.iter().any(|stmt| !matches!(stmt, Stmt::FnDecl(_)))
    }
}
