use std::collections::HashMap;

use crate::{
    ast::types::{FunctionType, Type},
    errors::errors::{Error, ErrorImpl},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A local variable; `slot` is unique within its function.
    Variable { slot: usize },
    Parameter { index: usize, slot: usize },
    Function,
    Builtin(Builtin),
}

/// A resolved name. Two symbols are the same binding only if they are equal,
/// same-named variables in sibling scopes differ by slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub depth: usize,
    pub kind: SymbolKind,
}

impl Symbol {
    /// Storage slot of a variable or parameter.
    pub fn slot(&self) -> Option<usize> {
        match self.kind {
            SymbolKind::Variable { slot } | SymbolKind::Parameter { slot, .. } => Some(slot),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.slot().is_some()
    }
}

/// One lexical scope. Iteration follows declaration order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
    order: Vec<String>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|name| self.symbols.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, symbol: Symbol) {
        self.order.push(symbol.name.clone());
        self.symbols.insert(symbol.name.clone(), symbol);
    }
}

/// Stack of scopes, module scope at the bottom.
///
/// The module scope lives as long as the compilation unit; every other
/// scope is pushed and popped around a function body or block.
#[derive(Debug, Clone)]
pub struct TypeEnvironment {
    scopes: Vec<Scope>,
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnvironment {
    pub fn new() -> Self {
        TypeEnvironment {
            scopes: vec![Scope::default()],
        }
    }

    /// A module scope pre-populated with the built-in functions.
    pub fn with_builtins() -> Self {
        let mut environment = Self::new();
        environment.scopes[0].insert(Symbol {
            name: Builtin::Print.name().to_string(),
            ty: Type::Function(FunctionType::new(vec![], Type::Unit)),
            depth: 0,
            kind: SymbolKind::Builtin(Builtin::Print),
        });
        environment
    }

    /// Depth of the innermost scope; the module scope is 0.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Declares `name` in the innermost scope.
    pub fn declare(&mut self, name: &str, ty: Type, kind: SymbolKind) -> Result<Symbol, Error> {
        let depth = self.depth();
        let scope = self.scopes.last_mut().ok_or_else(|| {
            Error::unlocated(ErrorImpl::UnreachableCode {
                function: name.to_string(),
                message: String::from("type environment has no scopes"),
            })
        })?;

        if scope.get(name).is_some() {
            return Err(Error::unlocated(ErrorImpl::DuplicateName {
                name: name.to_string(),
            }));
        }

        let symbol = Symbol {
            name: name.to_string(),
            ty,
            depth,
            kind,
        };
        scope.insert(symbol.clone());
        Ok(symbol)
    }

    /// Resolves `name`, innermost scope first.
    pub fn lookup(&self, name: &str) -> Result<&Symbol, Error> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| {
                Error::unlocated(ErrorImpl::UndefinedName {
                    name: name.to_string(),
                })
            })
    }

    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Re-enters a scope previously returned by `pop_scope`.
    pub fn enter_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pops the innermost scope. The module scope is never popped.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn module_scope(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Functions declared at module level, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.module_scope()
            .iter()
            .filter(|symbol| symbol.kind == SymbolKind::Function)
    }
}
