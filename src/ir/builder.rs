use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    ast::{
        expressions::{BinaryOperator, UnaryOperator},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        environment::{Symbol, SymbolKind},
        type_checker::{CheckedProgram, ENTRY_FUNCTION},
        typed_ast::{collect_callees, TypedEntry, TypedExpr, TypedExprKind, TypedFunction, TypedStmt},
    },
};

use super::ir::{
    BasicBlock, BlockId, CompilationUnit, Constant, FunctionUnit, Instruction, Operand, Terminator,
    ValueId,
};

#[derive(Debug)]
struct PendingBlock {
    id: BlockId,
    label: String,
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

/// Lowers the typed statements of one function into basic blocks.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    blocks: Vec<PendingBlock>,
    current: BlockId,
    next_value: u32,
    next_slot: usize,
    locals: Vec<Symbol>,
}

impl FunctionBuilder {
    pub fn new(name: &str, locals: Vec<Symbol>, slot_count: usize) -> Self {
        let mut builder = FunctionBuilder {
            name: name.to_string(),
            blocks: vec![],
            current: BlockId(0),
            next_value: 0,
            next_slot: slot_count,
            locals,
        };
        builder.current = builder.add_block("entry");
        builder
    }

    fn add_block(&mut self, base: &str) -> BlockId {
        let id = BlockId(self.blocks.len());
        let label = if id.0 == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, id.0)
        };

        self.blocks.push(PendingBlock {
            id,
            label,
            instructions: vec![],
            terminator: None,
        });
        id
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    fn current_block(&mut self) -> &mut PendingBlock {
        &mut self.blocks[self.current.0]
    }

    fn is_terminated(&self) -> bool {
        self.blocks[self.current.0].terminator.is_some()
    }

    /// Code after a terminator goes to a fresh block with no predecessors.
    fn ensure_open(&mut self) {
        if self.is_terminated() {
            let dead = self.add_block("dead");
            self.switch_to(dead);
        }
    }

    fn fresh_value(&mut self) -> ValueId {
        let value = ValueId(self.next_value);
        self.next_value += 1;
        value
    }

    fn emit(&mut self, instruction: Instruction) {
        self.ensure_open();
        self.current_block().instructions.push(instruction);
    }

    fn terminate(&mut self, terminator: Terminator) {
        self.ensure_open();
        self.current_block().terminator = Some(terminator);
    }

    /// A compiler-introduced variable, named so it cannot clash with user names.
    fn hidden_local(&mut self, base: &str, ty: Type) -> Symbol {
        let slot = self.next_slot;
        self.next_slot += 1;

        let symbol = Symbol {
            name: format!("{}.{}", base, slot),
            ty,
            depth: 1,
            kind: SymbolKind::Variable { slot },
        };
        self.locals.push(symbol.clone());
        symbol
    }

    fn constant(&mut self, value: Constant) -> Operand {
        let dest = self.fresh_value();
        let ty = value.ty();
        self.emit(Instruction::Constant { dest, value });
        Operand { value: dest, ty }
    }

    fn internal_error(&self, message: impl Into<String>) -> Error {
        Error::unlocated(ErrorImpl::UnreachableCode {
            function: self.name.clone(),
            message: message.into(),
        })
    }

    /// Lowers an expression that must produce a value.
    fn lower_value(&mut self, expr: &TypedExpr) -> Result<Operand, Error> {
        self.lower_expr(expr)?
            .ok_or_else(|| self.internal_error("expression of type None used as a value").or_span(&expr.span))
    }

    /// Returns `None` for `Unit`-typed expressions.
    pub fn lower_expr(&mut self, expr: &TypedExpr) -> Result<Option<Operand>, Error> {
        let operand = match &expr.kind {
            TypedExprKind::Integer(value) => self.constant(Constant::Int(*value)),
            TypedExprKind::Float(value) => self.constant(Constant::Float(*value)),
            TypedExprKind::Boolean(value) => self.constant(Constant::Bool(*value)),
            TypedExprKind::String(value) => self.constant(Constant::Str(value.clone())),
            TypedExprKind::None => return Ok(None),
            TypedExprKind::Load(symbol) => {
                let dest = self.fresh_value();
                self.emit(Instruction::Load {
                    dest,
                    symbol: symbol.clone(),
                });
                Operand {
                    value: dest,
                    ty: symbol.ty.clone(),
                }
            }
            TypedExprKind::Binary {
                operator: operator @ (BinaryOperator::And | BinaryOperator::Or),
                left,
                right,
                ..
            } => self.lower_short_circuit(*operator, left, right)?,
            TypedExprKind::Binary {
                operator,
                operand_type,
                left,
                right,
            } => {
                let lhs = self.lower_value(left)?;
                let rhs = self.lower_value(right)?;
                let dest = self.fresh_value();
                self.emit(Instruction::BinaryOp {
                    dest,
                    op: *operator,
                    operand_type: operand_type.clone(),
                    lhs,
                    rhs,
                    result_type: expr.ty.clone(),
                });
                Operand {
                    value: dest,
                    ty: expr.ty.clone(),
                }
            }
            TypedExprKind::Unary { operator, operand } => {
                let value = self.lower_value(operand)?;

                // -x is 0 - x, not x is x == false
                let (op, identity) = match (operator, &value.ty) {
                    (UnaryOperator::Neg, Type::Float) => (BinaryOperator::Sub, Constant::Float(0.0)),
                    (UnaryOperator::Neg, _) => (BinaryOperator::Sub, Constant::Int(0)),
                    (UnaryOperator::Not, _) => (BinaryOperator::Eq, Constant::Bool(false)),
                };
                let identity = self.constant(identity);

                let (lhs, rhs) = match operator {
                    UnaryOperator::Neg => (identity, value),
                    UnaryOperator::Not => (value, identity),
                };

                let dest = self.fresh_value();
                self.emit(Instruction::BinaryOp {
                    dest,
                    op,
                    operand_type: lhs.ty.clone(),
                    lhs,
                    rhs,
                    result_type: expr.ty.clone(),
                });
                Operand {
                    value: dest,
                    ty: expr.ty.clone(),
                }
            }
            TypedExprKind::Call { callee, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.lower_value(argument))
                    .collect::<Result<Vec<_>, _>>()?;

                let dest = (expr.ty != Type::Unit).then(|| self.fresh_value());
                self.emit(Instruction::Call {
                    dest,
                    callee: callee.clone(),
                    arguments,
                    result_type: expr.ty.clone(),
                });

                match dest {
                    Some(value) => Operand {
                        value,
                        ty: expr.ty.clone(),
                    },
                    None => return Ok(None),
                }
            }
        };

        Ok(Some(operand))
    }

    /// `a and b` only evaluates `b` when `a` is true; `a or b` only when it is false.
    fn lower_short_circuit(
        &mut self,
        operator: BinaryOperator,
        left: &TypedExpr,
        right: &TypedExpr,
    ) -> Result<Operand, Error> {
        let base = if operator == BinaryOperator::And { "and" } else { "or" };
        let result = self.hidden_local(base, Type::Bool);

        let lhs = self.lower_value(left)?;
        self.emit(Instruction::Assign {
            symbol: result.clone(),
            value: lhs.clone(),
        });

        let rhs_block = self.add_block(&format!("{}.rhs", base));
        let end_block = self.add_block(&format!("{}.end", base));

        let (then_block, else_block) = match operator {
            BinaryOperator::And => (rhs_block, end_block),
            _ => (end_block, rhs_block),
        };
        self.terminate(Terminator::Branch {
            condition: lhs,
            then_block,
            else_block,
        });

        self.switch_to(rhs_block);
        let rhs = self.lower_value(right)?;
        self.emit(Instruction::Assign {
            symbol: result.clone(),
            value: rhs,
        });
        self.terminate(Terminator::Jump(end_block));

        self.switch_to(end_block);
        let dest = self.fresh_value();
        self.emit(Instruction::Load { dest, symbol: result });

        Ok(Operand {
            value: dest,
            ty: Type::Bool,
        })
    }

    pub fn lower_block(&mut self, body: &[TypedStmt]) -> Result<(), Error> {
        for stmt in body {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn lower_stmt(&mut self, stmt: &TypedStmt) -> Result<(), Error> {
        match stmt {
            TypedStmt::Expression(expr) => {
                // Bare literals (docstrings) have no effect.
                if !is_literal(expr) {
                    self.lower_expr(expr)?;
                }
            }
            TypedStmt::Assign { symbol, value, .. } => {
                let value = self.lower_value(value)?;
                self.emit(Instruction::Assign {
                    symbol: symbol.clone(),
                    value,
                });
            }
            TypedStmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.lower_expr(value)?,
                    None => None,
                };
                self.terminate(Terminator::Return(value));
            }
            TypedStmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                let condition = self.lower_value(condition)?;
                let then_block = self.add_block("then");
                let else_block = else_body.as_ref().map(|_| self.add_block("else"));
                let end_block = self.add_block("if.end");

                self.terminate(Terminator::Branch {
                    condition,
                    then_block,
                    else_block: else_block.unwrap_or(end_block),
                });

                self.switch_to(then_block);
                self.lower_block(then_body)?;
                if !self.is_terminated() {
                    self.terminate(Terminator::Jump(end_block));
                }

                if let (Some(else_block), Some(else_body)) = (else_block, else_body) {
                    self.switch_to(else_block);
                    self.lower_block(else_body)?;
                    if !self.is_terminated() {
                        self.terminate(Terminator::Jump(end_block));
                    }
                }

                self.switch_to(end_block);
            }
            TypedStmt::While { condition, body, .. } => {
                let cond_block = self.add_block("while.cond");
                let body_block = self.add_block("while.body");
                let end_block = self.add_block("while.end");

                self.terminate(Terminator::Jump(cond_block));

                self.switch_to(cond_block);
                let condition = self.lower_value(condition)?;
                self.terminate(Terminator::Branch {
                    condition,
                    then_block: body_block,
                    else_block: end_block,
                });

                self.switch_to(body_block);
                self.lower_block(body)?;
                if !self.is_terminated() {
                    self.terminate(Terminator::Jump(cond_block));
                }

                self.switch_to(end_block);
            }
            TypedStmt::Pass => {}
        }

        Ok(())
    }

    /// Prunes blocks unreachable from the entry block and closes the rest.
    ///
    /// A reachable block without a terminator gets an implicit `return`
    /// when the function returns `Unit`; otherwise it is an internal error.
    pub fn finish(self, returns_unit: bool) -> Result<(Vec<BasicBlock>, Vec<Symbol>), Error> {
        let mut reachable = HashSet::new();
        let mut worklist = vec![BlockId(0)];

        while let Some(id) = worklist.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(terminator) = &self.blocks[id.0].terminator {
                worklist.extend(terminator.successors());
            }
        }

        let pruned = self.blocks.len() - reachable.len();
        if pruned > 0 {
            trace!(function = %self.name, pruned, "pruned unreachable blocks");
        }

        let mut blocks = vec![];
        for block in self.blocks {
            if !reachable.contains(&block.id) {
                continue;
            }

            let terminator = match block.terminator {
                Some(terminator) => terminator,
                None if returns_unit => Terminator::Return(None),
                None => {
                    return Err(Error::unlocated(ErrorImpl::UnreachableCode {
                        function: self.name.clone(),
                        message: format!("block `{}` falls through without a terminator", block.label),
                    }))
                }
            };

            blocks.push(BasicBlock {
                id: block.id,
                label: block.label,
                instructions: block.instructions,
                terminator,
            });
        }

        Ok((blocks, self.locals))
    }
}

fn is_literal(expr: &TypedExpr) -> bool {
    matches!(
        expr.kind,
        TypedExprKind::Integer(_)
            | TypedExprKind::Float(_)
            | TypedExprKind::Boolean(_)
            | TypedExprKind::String(_)
            | TypedExprKind::None
    )
}

pub fn lower_function(function: &TypedFunction) -> Result<FunctionUnit, Error> {
    let mut builder = FunctionBuilder::new(&function.name, function.locals.clone(), function.slot_count);
    builder.lower_block(&function.body)?;

    let (blocks, locals) = builder
        .finish(function.return_type == Type::Unit)
        .map_err(|error| error.or_span(&function.span))?;

    Ok(FunctionUnit {
        name: function.name.clone(),
        parameters: function.parameters.clone(),
        return_type: function.return_type.clone(),
        locals,
        blocks,
        is_entry: false,
    })
}

/// Wraps module-level statements into the implicit entry function.
pub fn lower_entry(entry: &TypedEntry) -> Result<FunctionUnit, Error> {
    let mut builder = FunctionBuilder::new(ENTRY_FUNCTION, entry.locals.clone(), entry.slot_count);
    builder.lower_block(&entry.statements)?;
    let (blocks, locals) = builder.finish(true)?;

    Ok(FunctionUnit {
        name: ENTRY_FUNCTION.to_string(),
        parameters: vec![],
        return_type: Type::Unit,
        locals,
        blocks,
        is_entry: true,
    })
}

/// Lowers every checked declaration of a unit. The entry function, when
/// present, comes last; only sibling functions actually called are kept
/// as externals.
#[tracing::instrument(level = "debug", skip_all, fields(unit = %name))]
pub fn build_unit(name: &str, checked: CheckedProgram) -> Result<CompilationUnit, Error> {
    let mut functions = vec![];

    for function in &checked.functions {
        let unit = lower_function(function)?;
        debug!(function = %unit.name, blocks = unit.blocks.len(), "lowered function");
        functions.push(unit);
    }

    if let Some(entry) = &checked.entry {
        let unit = lower_entry(entry)?;
        debug!(blocks = unit.blocks.len(), "lowered entry function");
        functions.push(unit);
    }

    let mut callees = vec![];
    for function in &checked.functions {
        collect_callees(&function.body, &mut callees);
    }
    if let Some(entry) = &checked.entry {
        collect_callees(&entry.statements, &mut callees);
    }
    let callees: HashSet<String> = callees.into_iter().collect();

    Ok(CompilationUnit {
        name: name.to_string(),
        functions,
        externs: checked
            .externs
            .into_iter()
            .filter(|signature| callees.contains(&signature.name))
            .collect(),
        environment: checked.environment,
    })
}
