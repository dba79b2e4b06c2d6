use std::fmt::Display;

use crate::{
    ast::{expressions::BinaryOperator, types::Type},
    type_checker::{
        environment::{Symbol, TypeEnvironment},
        type_checker::ExportedSignature,
    },
};

/// An SSA value. Each id is defined by exactly one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub value: ValueId,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::Int,
            Constant::Float(_) => Type::Float,
            Constant::Bool(_) => Type::Bool,
            Constant::Str(_) => Type::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Constant {
        dest: ValueId,
        value: Constant,
    },
    Load {
        dest: ValueId,
        symbol: Symbol,
    },
    /// Operands are brought to `operand_type` first, widening `Int` when
    /// the other side is `Float`.
    BinaryOp {
        dest: ValueId,
        op: BinaryOperator,
        operand_type: Type,
        lhs: Operand,
        rhs: Operand,
        result_type: Type,
    },
    /// `dest` is `None` for calls returning `Unit`.
    Call {
        dest: Option<ValueId>,
        callee: Symbol,
        arguments: Vec<Operand>,
        result_type: Type,
    },
    Assign {
        symbol: Symbol,
        value: Operand,
    },
}

impl Instruction {
    pub fn dest(&self) -> Option<ValueId> {
        match self {
            Instruction::Constant { dest, .. }
            | Instruction::Load { dest, .. }
            | Instruction::BinaryOp { dest, .. } => Some(*dest),
            Instruction::Call { dest, .. } => *dest,
            Instruction::Assign { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Return(Option<Operand>),
    Branch {
        condition: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Jump(BlockId),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Return(_) => vec![],
            Terminator::Branch {
                then_block, else_block, ..
            } => vec![*then_block, *else_block],
            Terminator::Jump(target) => vec![*target],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionUnit {
    pub name: String,
    pub parameters: Vec<Symbol>,
    pub return_type: Type,
    /// Every variable needing storage, parameters excluded.
    pub locals: Vec<Symbol>,
    /// The first block is the entry block; all blocks are reachable from it.
    pub blocks: Vec<BasicBlock>,
    /// The implicit `main` built from module-level statements.
    pub is_entry: bool,
}

impl FunctionUnit {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Values defined in the function, in definition order.
    pub fn defined_values(&self) -> Vec<ValueId> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter().filter_map(Instruction::dest))
            .collect()
    }
}

/// Everything the code generator needs for one source file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub name: String,
    pub functions: Vec<FunctionUnit>,
    /// Functions of sibling units called from this one.
    pub externs: Vec<ExportedSignature>,
    pub environment: TypeEnvironment,
}

impl CompilationUnit {
    pub fn function(&self, name: &str) -> Option<&FunctionUnit> {
        self.functions.iter().find(|function| function.name == name)
    }
}
