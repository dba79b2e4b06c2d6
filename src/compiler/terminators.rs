use crate::{
    errors::errors::Error,
    ir::ir::{FunctionUnit, Terminator},
};

use super::compiler::Compiler;

/// Generates the instruction closing an LLVM block.
///
/// The entry function returns `0` from `main`; a returned `Int` in a
/// `Float` function is widened first.
pub fn gen_terminator<'a>(
    compiler: &mut Compiler<'a>,
    terminator: &Terminator,
    function: &FunctionUnit,
) -> Result<(), Error> {
    match terminator {
        Terminator::Return(_) if function.is_entry => {
            let zero = compiler.context.i32_type().const_zero();
            compiler.builder.build_return(Some(&zero))?;
        }
        Terminator::Return(None) => {
            compiler.builder.build_return(None)?;
        }
        Terminator::Return(Some(value)) => {
            let value = compiler.widened_value(value, &function.return_type)?;
            compiler.builder.build_return(Some(&value))?;
        }
        Terminator::Branch {
            condition,
            then_block,
            else_block,
        } => {
            let condition = compiler.value(condition)?.into_int_value();
            compiler.builder.build_conditional_branch(
                condition,
                compiler.block(*then_block)?,
                compiler.block(*else_block)?,
            )?;
        }
        Terminator::Jump(target) => {
            compiler.builder.build_unconditional_branch(compiler.block(*target)?)?;
        }
    }

    Ok(())
}
