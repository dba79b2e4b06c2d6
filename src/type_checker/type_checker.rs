use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::Program,
        expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
        statements::{FnDeclStmt, Stmt},
        types::{FunctionType, Type},
    },
    errors::errors::{Diagnostic, Error, ErrorImpl},
    Span,
};

use super::{
    environment::{Builtin, Scope, Symbol, SymbolKind, TypeEnvironment},
    typed_ast::{
        always_returns, collect_bindings, collect_callees, collect_loads, TypedEntry, TypedExpr,
        TypedExprKind, TypedFunction, TypedStmt,
    },
};

/// Name of the implicit function holding module-level statements.
pub const ENTRY_FUNCTION: &str = "main";

/// Names user functions may not take: the entry point and the C runtime
/// symbols the generated code links against.
pub const RESERVED_NAMES: [&str; 2] = [ENTRY_FUNCTION, "printf"];

/// Declaration name reported for failing module-level statements.
pub const MODULE_DECLARATION: &str = "<module>";

/// The part of a function other compilation units may depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportedSignature {
    pub name: String,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl ExportedSignature {
    pub fn function_type(&self) -> FunctionType {
        FunctionType::new(self.parameters.clone(), self.return_type.clone())
    }
}

/// Result of checking one unit: everything that passed, plus one
/// diagnostic per declaration that did not.
#[derive(Debug)]
pub struct CheckedProgram {
    pub functions: Vec<TypedFunction>,
    /// Present when the unit has module-level statements.
    pub entry: Option<TypedEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub environment: TypeEnvironment,
    /// Sibling-unit functions that were declared in the module scope.
    pub externs: Vec<ExportedSignature>,
}

impl CheckedProgram {
    /// Signatures of the functions that passed checking, in source order.
    pub fn exported_signatures(&self) -> Vec<ExportedSignature> {
        self.functions
            .iter()
            .map(|function| ExportedSignature {
                name: function.name.clone(),
                parameters: function.parameters.iter().map(|parameter| parameter.ty.clone()).collect(),
                return_type: function.return_type.clone(),
            })
            .collect()
    }
}

#[derive(Debug)]
struct FunctionContext {
    name: String,
    /// `None` for the entry function, where `return` is not allowed.
    return_type: Option<Type>,
    next_slot: usize,
    locals: Vec<Symbol>,
}

impl FunctionContext {
    fn new(name: &str, return_type: Option<Type>) -> Self {
        FunctionContext {
            name: name.to_string(),
            return_type,
            next_slot: 0,
            locals: vec![],
        }
    }

    fn allocate_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }
}

#[derive(Debug)]
pub struct TypeChecker {
    pub environment: TypeEnvironment,
    context: FunctionContext,
    /// Scope of the entry function, parked while a `def` body is checked.
    entry_scope: Scope,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            environment: TypeEnvironment::with_builtins(),
            context: FunctionContext::new(ENTRY_FUNCTION, None),
            entry_scope: Scope::default(),
        }
    }

    fn declare_variable(&mut self, name: &str, ty: Type, span: &Span) -> Result<Symbol, Error> {
        let slot = self.context.allocate_slot();
        let symbol = self
            .environment
            .declare(name, ty, SymbolKind::Variable { slot })
            .map_err(|error| error.or_span(span))?;

        trace!(name, slot, depth = symbol.depth, "declared variable");
        self.context.locals.push(symbol.clone());
        Ok(symbol)
    }

    /// Declares a function's signature in the module scope.
    fn declare_function(&mut self, function: &FnDeclStmt) -> Result<FunctionType, Error> {
        if RESERVED_NAMES.contains(&function.name.as_str()) {
            return Err(Error::spanned(
                ErrorImpl::ReservedName {
                    name: function.name.clone(),
                },
                function.span.clone(),
            ));
        }

        let signature = resolve_signature(function)?;
        self.environment
            .declare(&function.name, Type::Function(signature.clone()), SymbolKind::Function)
            .map_err(|error| error.or_span(&function.span))?;

        Ok(signature)
    }

    fn check_function(&mut self, function: &FnDeclStmt, signature: &FunctionType) -> Result<TypedFunction, Error> {
        let symbol = self
            .environment
            .lookup(&function.name)
            .map_err(|error| error.or_span(&function.span))?
            .clone();

        let outer = std::mem::replace(
            &mut self.context,
            FunctionContext::new(&function.name, Some((*signature.return_type).clone())),
        );
        self.environment.push_scope();

        let result = self.check_function_body(function, signature);

        self.environment.pop_scope();
        let context = std::mem::replace(&mut self.context, outer);
        let (parameters, body) = result?;

        Ok(TypedFunction {
            name: function.name.clone(),
            symbol,
            parameters,
            return_type: (*signature.return_type).clone(),
            locals: context.locals,
            slot_count: context.next_slot,
            body,
            span: function.span.clone(),
        })
    }

    fn check_function_body(
        &mut self,
        function: &FnDeclStmt,
        signature: &FunctionType,
    ) -> Result<(Vec<Symbol>, Vec<TypedStmt>), Error> {
        let mut parameters = vec![];

        for (index, (parameter, ty)) in function.parameters.iter().zip(&signature.parameters).enumerate() {
            let slot = self.context.allocate_slot();
            let symbol = self
                .environment
                .declare(&parameter.name, ty.clone(), SymbolKind::Parameter { index, slot })
                .map_err(|error| error.or_span(&parameter.span))?;
            parameters.push(symbol);
        }

        let body = type_check_block(self, &function.body)?;

        if *signature.return_type != Type::Unit && !always_returns(&body) {
            return Err(Error::spanned(
                ErrorImpl::MissingReturn {
                    function: function.name.clone(),
                    expected: signature.return_type.to_string(),
                },
                function.span.clone(),
            ));
        }

        Ok((parameters, body))
    }

    /// Checks one module-level statement inside the entry function's scope.
    fn check_top_level(&mut self, stmt: &Stmt) -> Result<TypedStmt, Error> {
        let scope = std::mem::take(&mut self.entry_scope);
        self.environment.enter_scope(scope);

        let result = type_check_stmt(self, stmt);

        self.entry_scope = self.environment.pop_scope().unwrap_or_default();
        result
    }
}

/// Resolves parameter and return annotations into a function type.
pub fn resolve_signature(function: &FnDeclStmt) -> Result<FunctionType, Error> {
    let mut parameters = vec![];

    for parameter in &function.parameters {
        let annotation = parameter.annotation.as_ref().ok_or_else(|| {
            Error::spanned(
                ErrorImpl::MissingAnnotation {
                    declaration: function.name.clone(),
                    item: format!("parameter `{}`", parameter.name),
                },
                parameter.span.clone(),
            )
        })?;

        let ty = annotation.resolve()?;
        if ty == Type::Unit {
            return Err(Error::spanned(
                ErrorImpl::UnitBinding {
                    name: parameter.name.clone(),
                },
                parameter.span.clone(),
            ));
        }
        parameters.push(ty);
    }

    let return_type = function
        .return_type
        .as_ref()
        .ok_or_else(|| {
            Error::spanned(
                ErrorImpl::MissingAnnotation {
                    declaration: function.name.clone(),
                    item: String::from("the return type"),
                },
                function.span.clone(),
            )
        })?
        .resolve()?;

    Ok(FunctionType::new(parameters, return_type))
}

/// Signatures of every well-annotated function in `program`, before any
/// body is checked. The functions a unit finally exports are a subset, see
/// `CheckedProgram::exported_signatures`.
pub fn collect_signatures(program: &Program) -> Vec<ExportedSignature> {
    let mut seen = HashSet::new();

    program
        .functions()
        .filter(|function| !RESERVED_NAMES.contains(&function.name.as_str()) && seen.insert(function.name.clone()))
        .filter_map(|function| {
            resolve_signature(function).ok().map(|signature| ExportedSignature {
                name: function.name.clone(),
                parameters: signature.parameters,
                return_type: *signature.return_type,
            })
        })
        .collect()
}

/// Checks every declaration of `program`.
///
/// Signatures are declared first so bodies may call functions defined later
/// in the file. A declaration stops at its first error; checking carries on
/// with the next one. Declarations calling a function whose body failed are
/// dropped as well, so the surviving set is closed under calls.
#[tracing::instrument(level = "debug", skip_all, fields(file = %program.file))]
pub fn type_check(program: &Program, externs: &[ExportedSignature]) -> CheckedProgram {
    let mut checker = TypeChecker::new();
    let mut failures: Vec<(usize, Diagnostic)> = vec![];
    let mut signatures: HashMap<usize, Result<FunctionType, Error>> = HashMap::new();

    for (index, stmt) in program.body.iter().enumerate() {
        if let Stmt::FnDecl(function) = stmt {
            signatures.insert(index, checker.declare_function(function));
        }
    }

    // Local definitions shadow sibling units' functions of the same name.
    let mut declared_externs = vec![];
    for signature in externs {
        let ty = Type::Function(signature.function_type());
        match checker.environment.declare(&signature.name, ty, SymbolKind::Function) {
            Ok(_) => declared_externs.push(signature.clone()),
            Err(error) => debug!(name = %signature.name, %error, "skipping external signature"),
        }
    }

    let mut functions: Vec<(usize, TypedFunction)> = vec![];
    let mut statements: Vec<(usize, TypedStmt)> = vec![];
    let mut failed: HashSet<String> = HashSet::new();

    for (index, stmt) in program.body.iter().enumerate() {
        match stmt {
            Stmt::FnDecl(function) => {
                let result = match signatures.remove(&index) {
                    Some(Ok(signature)) => checker.check_function(function, &signature).map_err(|error| {
                        failed.insert(function.name.clone());
                        error
                    }),
                    Some(Err(error)) => Err(error),
                    None => continue,
                };

                match result {
                    Ok(typed) => {
                        debug!(function = %function.name, "checked function");
                        functions.push((index, typed));
                    }
                    Err(error) => {
                        debug!(function = %function.name, %error, "function rejected");
                        failures.push((index, Diagnostic::from_error(&function.name, &error)));
                    }
                }
            }
            other => match checker.check_top_level(other) {
                Ok(typed) => statements.push((index, typed)),
                Err(error) => {
                    debug!(%error, "module statement rejected");
                    failures.push((index, Diagnostic::from_error(MODULE_DECLARATION, &error)));
                }
            },
        }
    }

    // Drop callers of failed functions until nothing changes.
    loop {
        let mut changed = false;

        functions.retain(|(index, function)| match first_failed_callee(&function.body, &failed) {
            Some(callee) => {
                let error = Error::spanned(ErrorImpl::DependsOnFailed { callee }, function.span.clone());
                failures.push((*index, Diagnostic::from_error(&function.name, &error)));
                failed.insert(function.name.clone());
                changed = true;
                false
            }
            None => true,
        });

        if !changed {
            break;
        }
    }

    // Module statements run in order. A dropped statement leaves its
    // variables unset, so later statements reading them are dropped too.
    let mut unset: HashSet<Symbol> = HashSet::new();
    statements.retain(|(index, stmt)| {
        let body = std::slice::from_ref(stmt);
        let reason = match first_failed_callee(body, &failed) {
            Some(callee) => Some(ErrorImpl::DependsOnFailed { callee }),
            None => first_unset_load(body, &unset).map(|name| ErrorImpl::ReadsDropped { name }),
        };

        match reason {
            Some(reason) => {
                let span = statement_span(stmt).unwrap_or_else(|| program_span(program));
                let error = Error::spanned(reason, span);
                debug!(%error, "module statement dropped");
                failures.push((*index, Diagnostic::from_error(MODULE_DECLARATION, &error)));

                let mut bindings = vec![];
                collect_bindings(body, &mut bindings);
                unset.extend(bindings);
                false
            }
            None => true,
        }
    });

    failures.sort_by_key(|(index, _)| *index);

    let entry = program.has_top_level_statements().then(|| TypedEntry {
        statements: statements.into_iter().map(|(_, stmt)| stmt).collect(),
        locals: checker.context.locals.clone(),
        slot_count: checker.context.next_slot,
    });

    CheckedProgram {
        functions: functions.into_iter().map(|(_, function)| function).collect(),
        entry,
        diagnostics: failures.into_iter().map(|(_, diagnostic)| diagnostic).collect(),
        environment: checker.environment,
        externs: declared_externs,
    }
}

fn first_failed_callee(body: &[TypedStmt], failed: &HashSet<String>) -> Option<String> {
    if failed.is_empty() {
        return None;
    }

    let mut callees = vec![];
    collect_callees(body, &mut callees);
    callees.into_iter().find(|callee| failed.contains(callee))
}

fn first_unset_load(body: &[TypedStmt], unset: &HashSet<Symbol>) -> Option<String> {
    if unset.is_empty() {
        return None;
    }

    let mut loads = vec![];
    collect_loads(body, &mut loads);
    loads.into_iter().find(|symbol| unset.contains(symbol)).map(|symbol| symbol.name)
}

fn statement_span(stmt: &TypedStmt) -> Option<Span> {
    match stmt {
        TypedStmt::Expression(expr) => Some(expr.span.clone()),
        TypedStmt::Assign { span, .. }
        | TypedStmt::Return { span, .. }
        | TypedStmt::If { span, .. }
        | TypedStmt::While { span, .. } => Some(span.clone()),
        TypedStmt::Pass => None,
    }
}

fn program_span(program: &Program) -> Span {
    let position = crate::Position(0, std::sync::Arc::clone(&program.file));
    Span {
        start: position.clone(),
        end: position,
    }
}

pub fn type_check_block(type_checker: &mut TypeChecker, body: &[Stmt]) -> Result<Vec<TypedStmt>, Error> {
    body.iter().map(|stmt| type_check_stmt(type_checker, stmt)).collect()
}

/// Checks `body` in a fresh scope, popped whether or not checking succeeds.
fn type_check_scoped_block(type_checker: &mut TypeChecker, body: &[Stmt]) -> Result<Vec<TypedStmt>, Error> {
    type_checker.environment.push_scope();
    let result = type_check_block(type_checker, body);
    type_checker.environment.pop_scope();
    result
}

fn expect_condition(condition: TypedExpr, construct: &str) -> Result<TypedExpr, Error> {
    if condition.ty != Type::Bool {
        return Err(Error::spanned(
            ErrorImpl::TypeMismatch {
                operator: construct.to_string(),
                expected: Type::Bool.to_string(),
                received: condition.ty.to_string(),
            },
            condition.span.clone(),
        ));
    }
    Ok(condition)
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, ast: &Stmt) -> Result<TypedStmt, Error> {
    match ast {
        Stmt::FnDecl(function) => Err(Error::spanned(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from("def"),
                message: String::from("functions can only be defined at module level"),
            },
            function.span.clone(),
        )),
        Stmt::VarDecl(decl) => {
            let ty = decl.annotation.resolve()?;
            if ty == Type::Unit {
                return Err(Error::spanned(
                    ErrorImpl::UnitBinding {
                        name: decl.name.clone(),
                    },
                    decl.span.clone(),
                ));
            }

            let value = type_check_expr(type_checker, &decl.value)?;
            if value.ty != ty {
                return Err(Error::spanned(
                    ErrorImpl::TypeMismatch {
                        operator: String::from("="),
                        expected: ty.to_string(),
                        received: value.ty.to_string(),
                    },
                    value.span.clone(),
                ));
            }

            let symbol = type_checker.declare_variable(&decl.name, ty, &decl.span)?;
            Ok(TypedStmt::Assign {
                symbol,
                value,
                span: decl.span.clone(),
            })
        }
        Stmt::Assign(assign) => {
            let value = type_check_expr(type_checker, &assign.value)?;

            let existing = type_checker
                .environment
                .lookup(&assign.name)
                .ok()
                .filter(|symbol| symbol.is_variable())
                .cloned();

            let symbol = match existing {
                Some(symbol) => {
                    if value.ty != symbol.ty {
                        return Err(Error::spanned(
                            ErrorImpl::TypeMismatch {
                                operator: String::from("="),
                                expected: symbol.ty.to_string(),
                                received: value.ty.to_string(),
                            },
                            value.span.clone(),
                        ));
                    }
                    symbol
                }
                None => {
                    if value.ty == Type::Unit {
                        return Err(Error::spanned(
                            ErrorImpl::UnitBinding {
                                name: assign.name.clone(),
                            },
                            assign.span.clone(),
                        ));
                    }
                    type_checker.declare_variable(&assign.name, value.ty.clone(), &assign.span)?
                }
            };

            Ok(TypedStmt::Assign {
                symbol,
                value,
                span: assign.span.clone(),
            })
        }
        Stmt::Return(ret) => {
            let expected = match &type_checker.context.return_type {
                Some(expected) => expected.clone(),
                None => return Err(Error::spanned(ErrorImpl::ReturnOutsideFunction, ret.span.clone())),
            };

            let value = match &ret.value {
                Some(value) => Some(type_check_expr(type_checker, value)?),
                None => None,
            };
            let received = value.as_ref().map(|value| value.ty.clone()).unwrap_or(Type::Unit);

            if !received.widens_to(&expected) {
                return Err(Error::spanned(
                    ErrorImpl::ReturnType {
                        function: type_checker.context.name.clone(),
                        expected: expected.to_string(),
                        received: received.to_string(),
                    },
                    ret.span.clone(),
                ));
            }

            Ok(TypedStmt::Return {
                value,
                span: ret.span.clone(),
            })
        }
        Stmt::If(if_stmt) => {
            let condition = type_check_expr(type_checker, &if_stmt.condition)?;
            let condition = expect_condition(condition, "if")?;
            let then_body = type_check_scoped_block(type_checker, &if_stmt.then_body)?;
            let else_body = match &if_stmt.else_body {
                Some(else_body) => Some(type_check_scoped_block(type_checker, else_body)?),
                None => None,
            };

            Ok(TypedStmt::If {
                condition,
                then_body,
                else_body,
                span: if_stmt.span.clone(),
            })
        }
        Stmt::While(while_stmt) => {
            let condition = type_check_expr(type_checker, &while_stmt.condition)?;
            let condition = expect_condition(condition, "while")?;
            let body = type_check_scoped_block(type_checker, &while_stmt.body)?;

            Ok(TypedStmt::While {
                condition,
                body,
                span: while_stmt.span.clone(),
            })
        }
        Stmt::Expression(expr) => Ok(TypedStmt::Expression(type_check_expr(type_checker, expr)?)),
        Stmt::Pass(_) => Ok(TypedStmt::Pass),
    }
}

fn mismatch(operator: impl ToString, expected: impl ToString, received: &Type, span: &Span) -> Error {
    Error::spanned(
        ErrorImpl::TypeMismatch {
            operator: operator.to_string(),
            expected: expected.to_string(),
            received: received.to_string(),
        },
        span.clone(),
    )
}

/// Operand and result types of `left <operator> right`.
fn check_binary(operator: BinaryOperator, left: &Type, right: &Type, span: &Span) -> Result<(Type, Type), Error> {
    if operator.is_logical() {
        return match (left, right) {
            (Type::Bool, Type::Bool) => Ok((Type::Bool, Type::Bool)),
            (Type::Bool, other) | (other, _) => Err(mismatch(operator, Type::Bool, other, span)),
        };
    }

    if operator.is_equality() {
        if let Some(joined) = left.numeric_join(right) {
            return Ok((joined, Type::Bool));
        }
        return match (left, right) {
            (Type::Bool, Type::Bool) => Ok((Type::Bool, Type::Bool)),
            (Type::Int | Type::Float | Type::Bool, other) => Err(mismatch(operator, left, other, span)),
            (other, _) => Err(mismatch(operator, "int, float or bool", other, span)),
        };
    }

    let joined = match left.numeric_join(right) {
        Some(joined) => joined,
        None if left.is_numeric() => return Err(mismatch(operator, left, right, span)),
        None => return Err(mismatch(operator, "int or float", left, span)),
    };

    if operator.is_ordering() {
        Ok((joined, Type::Bool))
    } else if operator == BinaryOperator::Div {
        Ok((Type::Float, Type::Float))
    } else {
        Ok((joined.clone(), joined))
    }
}

pub fn type_check_expr(type_checker: &mut TypeChecker, ast: &Expr) -> Result<TypedExpr, Error> {
    let span = ast.span.clone();

    match &ast.kind {
        ExprKind::Integer(value) => Ok(TypedExpr::new(TypedExprKind::Integer(*value), Type::Int, span)),
        ExprKind::Float(value) => Ok(TypedExpr::new(TypedExprKind::Float(*value), Type::Float, span)),
        ExprKind::Boolean(value) => Ok(TypedExpr::new(TypedExprKind::Boolean(*value), Type::Bool, span)),
        ExprKind::String(value) => Ok(TypedExpr::new(TypedExprKind::String(value.clone()), Type::Str, span)),
        ExprKind::None => Ok(TypedExpr::new(TypedExprKind::None, Type::Unit, span)),
        ExprKind::Symbol(name) => {
            let symbol = type_checker
                .environment
                .lookup(name)
                .map_err(|error| error.or_span(&span))?
                .clone();

            if !symbol.is_variable() {
                return Err(Error::spanned(ErrorImpl::NotAValue { name: name.clone() }, span));
            }

            let ty = symbol.ty.clone();
            Ok(TypedExpr::new(TypedExprKind::Load(symbol), ty, span))
        }
        ExprKind::Binary { operator, left, right } => {
            let left = type_check_expr(type_checker, left)?;
            let right = type_check_expr(type_checker, right)?;
            let (operand_type, result_type) = check_binary(*operator, &left.ty, &right.ty, &span)?;

            Ok(TypedExpr::new(
                TypedExprKind::Binary {
                    operator: *operator,
                    operand_type,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                result_type,
                span,
            ))
        }
        ExprKind::Unary { operator, operand } => {
            let operand = type_check_expr(type_checker, operand)?;

            let valid = match operator {
                UnaryOperator::Neg => operand.ty.is_numeric(),
                UnaryOperator::Not => operand.ty == Type::Bool,
            };
            if !valid {
                let expected = match operator {
                    UnaryOperator::Neg => "int or float",
                    UnaryOperator::Not => "bool",
                };
                return Err(mismatch(operator, expected, &operand.ty, &span));
            }

            let ty = operand.ty.clone();
            Ok(TypedExpr::new(
                TypedExprKind::Unary {
                    operator: *operator,
                    operand: Box::new(operand),
                },
                ty,
                span,
            ))
        }
        ExprKind::Call {
            callee,
            callee_span,
            arguments,
        } => {
            let symbol = type_checker
                .environment
                .lookup(callee)
                .map_err(|error| error.or_span(callee_span))?
                .clone();

            match (&symbol.kind, &symbol.ty) {
                (SymbolKind::Builtin(Builtin::Print), _) => {
                    if arguments.len() > 1 {
                        return Err(Error::spanned(
                            ErrorImpl::Arity {
                                function: callee.clone(),
                                expected: 1,
                                received: arguments.len(),
                            },
                            span,
                        ));
                    }

                    let arguments = arguments
                        .iter()
                        .map(|argument| type_check_expr(type_checker, argument))
                        .collect::<Result<Vec<_>, _>>()?;

                    if let Some(argument) = arguments.iter().find(|argument| argument.ty == Type::Unit) {
                        return Err(Error::spanned(
                            ErrorImpl::ArgumentType {
                                function: callee.clone(),
                                index: 0,
                                expected: String::from("int, float, bool or str"),
                                received: argument.ty.to_string(),
                            },
                            argument.span.clone(),
                        ));
                    }

                    Ok(TypedExpr::new(
                        TypedExprKind::Call {
                            callee: symbol,
                            arguments,
                        },
                        Type::Unit,
                        span,
                    ))
                }
                (SymbolKind::Function, Type::Function(function_type)) => {
                    let function_type = function_type.clone();

                    if arguments.len() != function_type.parameters.len() {
                        return Err(Error::spanned(
                            ErrorImpl::Arity {
                                function: callee.clone(),
                                expected: function_type.parameters.len(),
                                received: arguments.len(),
                            },
                            span,
                        ));
                    }

                    let mut typed_arguments = vec![];
                    for (index, (argument, expected)) in arguments.iter().zip(&function_type.parameters).enumerate() {
                        let argument = type_check_expr(type_checker, argument)?;
                        if argument.ty != *expected {
                            return Err(Error::spanned(
                                ErrorImpl::ArgumentType {
                                    function: callee.clone(),
                                    index,
                                    expected: expected.to_string(),
                                    received: argument.ty.to_string(),
                                },
                                argument.span.clone(),
                            ));
                        }
                        typed_arguments.push(argument);
                    }

                    Ok(TypedExpr::new(
                        TypedExprKind::Call {
                            callee: symbol,
                            arguments: typed_arguments,
                        },
                        *function_type.return_type,
                        span,
                    ))
                }
                _ => Err(Error::spanned(
                    ErrorImpl::NotCallable {
                        name: callee.clone(),
                        type_: symbol.ty.to_string(),
                    },
                    callee_span.clone(),
                )),
            }
        }
    }
}
