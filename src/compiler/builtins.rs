//! Built-in functions.
//!
//! `print` is the only built-in; it lowers to a single `printf` call with a
//! format chosen by the argument's type.

use inkwell::values::BasicMetadataValueEnum;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    ir::ir::Operand,
};

use super::compiler::Compiler;

/// `printf` format used for a printed value of type `ty`.
pub fn print_format(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Int => Some("%lld\n"),
        Type::Float => Some("%g\n"),
        Type::Bool | Type::Str => Some("%s\n"),
        Type::Unit | Type::Function(_) => None,
    }
}

/// Generates `print(x)`. Booleans print as `True` or `False`; `print()`
/// prints an empty line.
pub fn gen_print<'a>(compiler: &mut Compiler<'a>, arguments: &[Operand]) -> Result<(), Error> {
    let printf = compiler.module.get_function("printf").ok_or_else(|| {
        Error::unlocated(ErrorImpl::Codegen {
            message: String::from("printf is not declared"),
        })
    })?;

    let mut args: Vec<BasicMetadataValueEnum<'a>> = vec![];

    match arguments.first() {
        None => args.push(compiler.string_constant("\n")?.into()),
        Some(argument) => {
            let format = print_format(&argument.ty).ok_or_else(|| {
                Error::unlocated(ErrorImpl::Codegen {
                    message: format!("cannot print a value of type {}", argument.ty),
                })
            })?;
            args.push(compiler.string_constant(format)?.into());

            let value = compiler.value(argument)?;
            if argument.ty == Type::Bool {
                let true_text = compiler.string_constant("True")?;
                let false_text = compiler.string_constant("False")?;
                let text = compiler
                    .builder
                    .build_select(value.into_int_value(), true_text, false_text, "")?;
                args.push(text.into());
            } else {
                args.push(value.into());
            }
        }
    }

    compiler.builder.build_call(printf, &args, "")?;
    Ok(())
}
