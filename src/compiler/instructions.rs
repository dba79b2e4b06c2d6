use inkwell::{
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FloatValue, IntValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::{expressions::BinaryOperator, types::Type},
    errors::errors::{Error, ErrorImpl},
    ir::ir::{Constant, Instruction},
    type_checker::environment::{Builtin, SymbolKind},
};

use super::{builtins::gen_print, compiler::Compiler};

/// Generates LLVM IR for one IR instruction, recording the value it defines.
pub fn gen_instruction<'a>(compiler: &mut Compiler<'a>, instruction: &Instruction) -> Result<(), Error> {
    match instruction {
        Instruction::Constant { dest, value } => {
            let value = gen_constant(compiler, value)?;
            compiler.values.insert(*dest, value);
        }
        Instruction::Load { dest, symbol } => {
            let alloca = compiler.slot(symbol.slot(), &symbol.name)?;
            let value = compiler.builder.build_load(alloca, &symbol.name)?;
            compiler.values.insert(*dest, value);
        }
        Instruction::Assign { symbol, value } => {
            let alloca = compiler.slot(symbol.slot(), &symbol.name)?;
            let value = compiler.value(value)?;
            compiler.builder.build_store(alloca, value)?;
        }
        Instruction::BinaryOp {
            dest,
            op,
            operand_type,
            lhs,
            rhs,
            ..
        } => {
            let lhs = compiler.widened_value(lhs, operand_type)?;
            let rhs = compiler.widened_value(rhs, operand_type)?;

            let value = match operand_type {
                Type::Int | Type::Bool => gen_int_binary(compiler, *op, lhs.into_int_value(), rhs.into_int_value())?,
                Type::Float => gen_float_binary(compiler, *op, lhs.into_float_value(), rhs.into_float_value())?,
                other => {
                    return Err(Error::unlocated(ErrorImpl::Codegen {
                        message: format!("operator `{}` applied to {}", op, other),
                    }))
                }
            };
            compiler.values.insert(*dest, value);
        }
        Instruction::Call {
            dest, callee, arguments, ..
        } => match &callee.kind {
            SymbolKind::Builtin(Builtin::Print) => gen_print(compiler, arguments)?,
            _ => {
                let function = compiler.module.get_function(&callee.name).ok_or_else(|| {
                    Error::unlocated(ErrorImpl::Codegen {
                        message: format!("function {:?} not found", callee.name),
                    })
                })?;

                let args = arguments
                    .iter()
                    .map(|argument| compiler.value(argument).map(BasicMetadataValueEnum::from))
                    .collect::<Result<Vec<_>, _>>()?;

                let result = compiler
                    .builder
                    .build_call(function, &args[..], "")?
                    .try_as_basic_value()
                    .left();

                if let (Some(dest), Some(result)) = (dest, result) {
                    compiler.values.insert(*dest, result);
                }
            }
        },
    }

    Ok(())
}

fn gen_constant<'a>(compiler: &mut Compiler<'a>, constant: &Constant) -> Result<BasicValueEnum<'a>, Error> {
    Ok(match constant {
        Constant::Int(value) => compiler.context.i64_type().const_int(*value as u64, true).into(),
        Constant::Float(value) => compiler.context.f64_type().const_float(*value).into(),
        Constant::Bool(value) => compiler.context.bool_type().const_int(*value as u64, false).into(),
        Constant::Str(value) => compiler.string_constant(value)?.into(),
    })
}

fn gen_int_binary<'a>(
    compiler: &Compiler<'a>,
    op: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match op {
        BinaryOperator::Add => builder.build_int_add(lhs, rhs, "")?,
        BinaryOperator::Sub => builder.build_int_sub(lhs, rhs, "")?,
        BinaryOperator::Mul => builder.build_int_mul(lhs, rhs, "")?,
        BinaryOperator::FloorDiv => {
            let (quotient, _, adjust) = gen_floor_adjustment(compiler, lhs, rhs)?;
            let adjust = builder.build_int_z_extend(adjust, lhs.get_type(), "")?;
            builder.build_int_sub(quotient, adjust, "")?
        }
        BinaryOperator::Mod => {
            let (_, remainder, adjust) = gen_floor_adjustment(compiler, lhs, rhs)?;
            let zero = lhs.get_type().const_zero();
            let offset = builder.build_select(adjust, rhs, zero, "")?.into_int_value();
            builder.build_int_add(remainder, offset, "")?
        }
        BinaryOperator::Eq => builder.build_int_compare(IntPredicate::EQ, lhs, rhs, "")?,
        BinaryOperator::NotEq => builder.build_int_compare(IntPredicate::NE, lhs, rhs, "")?,
        BinaryOperator::Less => builder.build_int_compare(IntPredicate::SLT, lhs, rhs, "")?,
        BinaryOperator::LessEq => builder.build_int_compare(IntPredicate::SLE, lhs, rhs, "")?,
        BinaryOperator::Greater => builder.build_int_compare(IntPredicate::SGT, lhs, rhs, "")?,
        BinaryOperator::GreaterEq => builder.build_int_compare(IntPredicate::SGE, lhs, rhs, "")?,
        BinaryOperator::Div | BinaryOperator::And | BinaryOperator::Or => {
            return Err(Error::unlocated(ErrorImpl::Codegen {
                message: format!("operator `{}` has no integer lowering", op),
            }))
        }
    };

    Ok(value.as_basic_value_enum())
}

/// Truncated quotient and remainder of `lhs / rhs`, plus whether they need
/// adjusting to round towards negative infinity (non-zero remainder whose
/// sign differs from the divisor's).
fn gen_floor_adjustment<'a>(
    compiler: &Compiler<'a>,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<(IntValue<'a>, IntValue<'a>, IntValue<'a>), Error> {
    let builder = &compiler.builder;
    let zero = lhs.get_type().const_zero();

    let quotient = builder.build_int_signed_div(lhs, rhs, "")?;
    let remainder = builder.build_int_signed_rem(lhs, rhs, "")?;

    let remainder_nonzero = builder.build_int_compare(IntPredicate::NE, remainder, zero, "")?;
    let remainder_negative = builder.build_int_compare(IntPredicate::SLT, remainder, zero, "")?;
    let divisor_negative = builder.build_int_compare(IntPredicate::SLT, rhs, zero, "")?;
    let signs_differ = builder.build_int_compare(IntPredicate::NE, remainder_negative, divisor_negative, "")?;
    let adjust = builder.build_and(remainder_nonzero, signs_differ, "")?;

    Ok((quotient, remainder, adjust))
}

fn gen_float_binary<'a>(
    compiler: &Compiler<'a>,
    op: BinaryOperator,
    lhs: FloatValue<'a>,
    rhs: FloatValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match op {
        BinaryOperator::Add => builder.build_float_add(lhs, rhs, "")?.as_basic_value_enum(),
        BinaryOperator::Sub => builder.build_float_sub(lhs, rhs, "")?.as_basic_value_enum(),
        BinaryOperator::Mul => builder.build_float_mul(lhs, rhs, "")?.as_basic_value_enum(),
        BinaryOperator::Div => builder.build_float_div(lhs, rhs, "")?.as_basic_value_enum(),
        BinaryOperator::FloorDiv => gen_float_floor_div(compiler, lhs, rhs)?.as_basic_value_enum(),
        BinaryOperator::Mod => {
            // a - b * floor(a / b)
            let floored = gen_float_floor_div(compiler, lhs, rhs)?;
            let product = builder.build_float_mul(rhs, floored, "")?;
            builder.build_float_sub(lhs, product, "")?.as_basic_value_enum()
        }
        BinaryOperator::Eq => float_compare(compiler, FloatPredicate::OEQ, lhs, rhs)?,
        BinaryOperator::NotEq => float_compare(compiler, FloatPredicate::UNE, lhs, rhs)?,
        BinaryOperator::Less => float_compare(compiler, FloatPredicate::OLT, lhs, rhs)?,
        BinaryOperator::LessEq => float_compare(compiler, FloatPredicate::OLE, lhs, rhs)?,
        BinaryOperator::Greater => float_compare(compiler, FloatPredicate::OGT, lhs, rhs)?,
        BinaryOperator::GreaterEq => float_compare(compiler, FloatPredicate::OGE, lhs, rhs)?,
        BinaryOperator::And | BinaryOperator::Or => {
            return Err(Error::unlocated(ErrorImpl::Codegen {
                message: format!("operator `{}` has no float lowering", op),
            }))
        }
    };

    Ok(value)
}

fn float_compare<'a>(
    compiler: &Compiler<'a>,
    predicate: FloatPredicate,
    lhs: FloatValue<'a>,
    rhs: FloatValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    Ok(compiler
        .builder
        .build_float_compare(predicate, lhs, rhs, "")?
        .as_basic_value_enum())
}

fn gen_float_floor_div<'a>(
    compiler: &Compiler<'a>,
    lhs: FloatValue<'a>,
    rhs: FloatValue<'a>,
) -> Result<FloatValue<'a>, Error> {
    let quotient = compiler.builder.build_float_div(lhs, rhs, "")?;

    compiler
        .builder
        .build_call(compiler.floor_function(), &[quotient.into()], "")?
        .try_as_basic_value()
        .left()
        .map(|value| value.into_float_value())
        .ok_or_else(|| {
            Error::unlocated(ErrorImpl::Codegen {
                message: String::from("llvm.floor.f64 returned no value"),
            })
        })
}
