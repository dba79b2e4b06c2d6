//! The typed tree produced by the type checker.
//!
//! Every expression carries its resolved `Type` and every name has been
//! replaced by the `Symbol` it resolves to. Nodes are immutable once built.

use crate::{
    ast::{
        expressions::{BinaryOperator, UnaryOperator},
        types::Type,
    },
    Span,
};

use super::environment::{Symbol, SymbolKind};

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    None,
    Load(Symbol),
    Binary {
        operator: BinaryOperator,
        /// Type both operands are brought to before the operation.
        operand_type: Type,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<TypedExpr>,
    },
    Call {
        callee: Symbol,
        arguments: Vec<TypedExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: Type,
    pub span: Span,
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: Type, span: Span) -> Self {
        TypedExpr { kind, ty, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Expression(TypedExpr),
    Assign {
        symbol: Symbol,
        value: TypedExpr,
        span: Span,
    },
    Return {
        value: Option<TypedExpr>,
        span: Span,
    },
    If {
        condition: TypedExpr,
        then_body: Vec<TypedStmt>,
        else_body: Option<Vec<TypedStmt>>,
        span: Span,
    },
    While {
        condition: TypedExpr,
        body: Vec<TypedStmt>,
        span: Span,
    },
    Pass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunction {
    pub name: String,
    pub symbol: Symbol,
    pub parameters: Vec<Symbol>,
    pub return_type: Type,
    /// Variables declared anywhere in the body, in declaration order.
    pub locals: Vec<Symbol>,
    /// First slot not used by a parameter or local.
    pub slot_count: usize,
    pub body: Vec<TypedStmt>,
    pub span: Span,
}

/// Module-level statements, which form the body of the implicit entry function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedEntry {
    pub statements: Vec<TypedStmt>,
    pub locals: Vec<Symbol>,
    pub slot_count: usize,
}

/// Whether every path through `body` ends in a `return`.
pub fn always_returns(body: &[TypedStmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        TypedStmt::Return { .. } => true,
        TypedStmt::If {
            then_body,
            else_body: Some(else_body),
            ..
        } => always_returns(then_body) && always_returns(else_body),
        _ => false,
    })
}

/// Names of user functions called anywhere in `body`.
pub fn collect_callees(body: &[TypedStmt], callees: &mut Vec<String>) {
    for stmt in body {
        match stmt {
            TypedStmt::Expression(expr) => collect_expr_callees(expr, callees),
            TypedStmt::Assign { value, .. } => collect_expr_callees(value, callees),
            TypedStmt::Return { value, .. } => {
                if let Some(value) = value {
                    collect_expr_callees(value, callees);
                }
            }
            TypedStmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                collect_expr_callees(condition, callees);
                collect_callees(then_body, callees);
                if let Some(else_body) = else_body {
                    collect_callees(else_body, callees);
                }
            }
            TypedStmt::While { condition, body, .. } => {
                collect_expr_callees(condition, callees);
                collect_callees(body, callees);
            }
            TypedStmt::Pass => {}
        }
    }
}

fn collect_expr_callees(expr: &TypedExpr, callees: &mut Vec<String>) {
    match &expr.kind {
        TypedExprKind::Binary { left, right, .. } => {
            collect_expr_callees(left, callees);
            collect_expr_callees(right, callees);
        }
        TypedExprKind::Unary { operand, .. } => collect_expr_callees(operand, callees),
        TypedExprKind::Call { callee, arguments } => {
            if callee.kind == SymbolKind::Function {
                callees.push(callee.name.clone());
            }
            for argument in arguments {
                collect_expr_callees(argument, callees);
            }
        }
        _ => {}
    }
}

/// Variables assigned anywhere in `body`, including nested blocks.
pub fn collect_bindings(body: &[TypedStmt], bindings: &mut Vec<Symbol>) {
    for stmt in body {
        match stmt {
            TypedStmt::Assign { symbol, .. } => bindings.push(symbol.clone()),
            TypedStmt::If {
                then_body, else_body, ..
            } => {
                collect_bindings(then_body, bindings);
                if let Some(else_body) = else_body {
                    collect_bindings(else_body, bindings);
                }
            }
            TypedStmt::While { body, .. } => collect_bindings(body, bindings),
            TypedStmt::Expression(_) | TypedStmt::Return { .. } | TypedStmt::Pass => {}
        }
    }
}

/// Variables read anywhere in `body`.
pub fn collect_loads(body: &[TypedStmt], loads: &mut Vec<Symbol>) {
    for stmt in body {
        match stmt {
            TypedStmt::Expression(expr) => collect_expr_loads(expr, loads),
            TypedStmt::Assign { value, .. } => collect_expr_loads(value, loads),
            TypedStmt::Return { value, .. } => {
                if let Some(value) = value {
                    collect_expr_loads(value, loads);
                }
            }
            TypedStmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                collect_expr_loads(condition, loads);
                collect_loads(then_body, loads);
                if let Some(else_body) = else_body {
                    collect_loads(else_body, loads);
                }
            }
            TypedStmt::While { condition, body, .. } => {
                collect_expr_loads(condition, loads);
                collect_loads(body, loads);
            }
            TypedStmt::Pass => {}
        }
    }
}

fn collect_expr_loads(expr: &TypedExpr, loads: &mut Vec<Symbol>) {
    match &expr.kind {
        TypedExprKind::Load(symbol) => loads.push(symbol.clone()),
        TypedExprKind::Binary { left, right, .. } => {
            collect_expr_loads(left, loads);
            collect_expr_loads(right, loads);
        }
        TypedExprKind::Unary { operand, .. } => collect_expr_loads(operand, loads),
        TypedExprKind::Call { arguments, .. } => {
            for argument in arguments {
                collect_expr_loads(argument, loads);
            }
        }
        _ => {}
    }
}
