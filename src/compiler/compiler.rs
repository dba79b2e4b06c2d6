//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives code generation
//! from a lowered `CompilationUnit` to LLVM IR text. It manages the LLVM
//! context, module and builder, type conversion and module verification.

use std::collections::HashMap;

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::{BasicValue, BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace,
};
use tracing::debug;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    ir::ir::{BlockId, CompilationUnit, FunctionUnit, Operand, ValueId},
    type_checker::type_checker::ExportedSignature,
};

use super::{instructions::gen_instruction, terminators::gen_terminator};

/// The main compiler structure that holds the state of code generation.
///
/// This structure manages:
/// - The LLVM context, module, and builder
/// - Storage slots and SSA values of the function being generated
/// - String literals already emitted as globals
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Map of storage slots to their LLVM alloca pointers
    pub named_allocas: HashMap<usize, PointerValue<'a>>,
    /// Map of IR values to the LLVM values computing them
    pub values: HashMap<ValueId, BasicValueEnum<'a>>,
    /// Map of IR blocks to their LLVM basic blocks
    pub blocks: HashMap<BlockId, BasicBlock<'a>>,
    string_constants: HashMap<String, PointerValue<'a>>,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance.
    ///
    /// # Arguments
    ///
    /// * `context` - Reference to the LLVM context
    /// * `unit_name` - Name of the unit being compiled (used for module naming)
    pub fn new(context: &'a Context, unit_name: &str) -> Self {
        Compiler {
            named_allocas: HashMap::new(),
            values: HashMap::new(),
            blocks: HashMap::new(),
            string_constants: HashMap::new(),
            module: context.create_module(unit_name),
            builder: context.create_builder(),
            context,
        }
    }

    /// Converts a value type to an LLVM basic type.
    ///
    /// `Unit` and function types have no value representation and are
    /// rejected with an internal error.
    pub fn convert_type(&self, ty: &Type) -> Result<BasicTypeEnum<'a>, Error> {
        match ty {
            Type::Int => Ok(self.context.i64_type().into()),
            Type::Float => Ok(self.context.f64_type().into()),
            Type::Bool => Ok(self.context.bool_type().into()),
            Type::Str => Ok(self.context.i8_type().ptr_type(AddressSpace::default()).into()),
            Type::Unit | Type::Function(_) => Err(Error::unlocated(ErrorImpl::Codegen {
                message: format!("type {} has no value representation", ty),
            })),
        }
    }

    /// Builds the LLVM function type for a signature. A `Unit` return maps to `void`.
    pub fn function_type(&self, parameters: &[Type], return_type: &Type) -> Result<FunctionType<'a>, Error> {
        let parameters = parameters
            .iter()
            .map(|ty| self.convert_type(ty).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>, _>>()?;

        match return_type {
            Type::Unit => Ok(self.context.void_type().fn_type(&parameters, false)),
            other => Ok(self.convert_type(other)?.fn_type(&parameters, false)),
        }
    }

    /// Declares `printf`, the C runtime function behind `print`.
    fn create_external_functions(&self) {
        let i8_ptr_type = self.context.i8_type().ptr_type(AddressSpace::default());
        let printf_type = self.context.i32_type().fn_type(&[i8_ptr_type.into()], true);
        self.module.add_function("printf", printf_type, Some(Linkage::External));
    }

    /// The `llvm.floor.f64` intrinsic, declared on first use.
    pub fn floor_function(&self) -> FunctionValue<'a> {
        self.module.get_function("llvm.floor.f64").unwrap_or_else(|| {
            let f64_type = self.context.f64_type();
            let floor_type = f64_type.fn_type(&[f64_type.into()], false);
            self.module.add_function("llvm.floor.f64", floor_type, None)
        })
    }

    /// Creates the function prototype in the module, with the `uwtable` and
    /// `nounwind` attributes every generated function carries.
    fn create_function_proto(&self, name: &str, function_type: FunctionType<'a>) -> FunctionValue<'a> {
        let function = self.module.add_function(name, function_type, Some(Linkage::External));

        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
        ];

        for attribute in attributes.iter() {
            function.add_attribute(AttributeLoc::Function, *attribute);
        }

        function
    }

    /// Declares a function of this unit. The entry function is `i32 main()`.
    fn declare_function(&self, function: &FunctionUnit) -> Result<FunctionValue<'a>, Error> {
        let function_type = if function.is_entry {
            self.context.i32_type().fn_type(&[], false)
        } else {
            let parameters: Vec<Type> = function.parameters.iter().map(|symbol| symbol.ty.clone()).collect();
            self.function_type(&parameters, &function.return_type)?
        };

        Ok(self.create_function_proto(&function.name, function_type))
    }

    /// Declares a function defined by a sibling unit.
    fn declare_extern(&self, signature: &ExportedSignature) -> Result<(), Error> {
        if self.module.get_function(&signature.name).is_some() {
            return Ok(());
        }

        let function_type = self.function_type(&signature.parameters, &signature.return_type)?;
        self.module
            .add_function(&signature.name, function_type, Some(Linkage::External));
        Ok(())
    }

    /// Returns a pointer to a private global holding `value`, creating it
    /// on first use.
    pub fn string_constant(&mut self, value: &str) -> Result<PointerValue<'a>, Error> {
        if let Some(pointer) = self.string_constants.get(value) {
            return Ok(*pointer);
        }

        let pointer = self.builder.build_global_string_ptr(value, ".str")?.as_pointer_value();
        self.string_constants.insert(value.to_string(), pointer);
        Ok(pointer)
    }

    /// The LLVM value computed for `operand`.
    pub fn value(&self, operand: &Operand) -> Result<BasicValueEnum<'a>, Error> {
        self.values.get(&operand.value).copied().ok_or_else(|| {
            Error::unlocated(ErrorImpl::Codegen {
                message: format!("value {} used before its definition", operand.value),
            })
        })
    }

    /// The LLVM value of `operand`, converted to `target` when an `Int`
    /// is used where a `Float` is expected.
    pub fn widened_value(&self, operand: &Operand, target: &Type) -> Result<BasicValueEnum<'a>, Error> {
        let value = self.value(operand)?;

        match (&operand.ty, target) {
            (Type::Int, Type::Float) => Ok(self
                .builder
                .build_signed_int_to_float(value.into_int_value(), self.context.f64_type(), "")?
                .as_basic_value_enum()),
            _ => Ok(value),
        }
    }

    pub fn slot(&self, slot: Option<usize>, name: &str) -> Result<PointerValue<'a>, Error> {
        slot.and_then(|slot| self.named_allocas.get(&slot).copied()).ok_or_else(|| {
            Error::unlocated(ErrorImpl::Codegen {
                message: format!("no storage for variable {:?}", name),
            })
        })
    }

    pub fn block(&self, id: BlockId) -> Result<BasicBlock<'a>, Error> {
        self.blocks.get(&id).copied().ok_or_else(|| {
            Error::unlocated(ErrorImpl::Codegen {
                message: format!("no basic block for block {}", id.0),
            })
        })
    }

    /// Zero value a local holds before its first assignment.
    fn zero_value(&mut self, ty: &Type) -> Result<BasicValueEnum<'a>, Error> {
        match ty {
            Type::Int => Ok(self.context.i64_type().const_zero().into()),
            Type::Float => Ok(self.context.f64_type().const_zero().into()),
            Type::Bool => Ok(self.context.bool_type().const_zero().into()),
            Type::Str => Ok(self.string_constant("")?.into()),
            other => Err(Error::unlocated(ErrorImpl::Codegen {
                message: format!("type {} cannot be stored", other),
            })),
        }
    }

    /// Generates the body of an already declared function.
    ///
    /// Parameters and locals get allocas at the top of the entry block;
    /// every IR block then maps onto one LLVM block with the same label.
    fn gen_function(&mut self, function: &FunctionUnit) -> Result<(), Error> {
        let function_value = self.module.get_function(&function.name).ok_or_else(|| {
            Error::unlocated(ErrorImpl::Codegen {
                message: format!("function {:?} was not declared", function.name),
            })
        })?;

        self.named_allocas.clear();
        self.values.clear();
        self.blocks.clear();

        for block in &function.blocks {
            let basic_block = self.context.append_basic_block(function_value, &block.label);
            self.blocks.insert(block.id, basic_block);
        }

        let entry = function
            .blocks
            .first()
            .map(|block| block.id)
            .ok_or_else(|| {
                Error::unlocated(ErrorImpl::Codegen {
                    message: format!("function {:?} has no blocks", function.name),
                })
            })?;
        self.builder.position_at_end(self.block(entry)?);

        for (parameter, value) in function.parameters.iter().zip(function_value.get_param_iter()) {
            value.set_name(&parameter.name);

            let alloca = self
                .builder
                .build_alloca(value.get_type(), &format!("{}.addr", parameter.name))?;
            self.builder.build_store(alloca, value)?;

            if let Some(slot) = parameter.slot() {
                self.named_allocas.insert(slot, alloca);
            }
        }

        for local in &function.locals {
            let alloca = self.builder.build_alloca(self.convert_type(&local.ty)?, &local.name)?;
            let zero = self.zero_value(&local.ty)?;
            self.builder.build_store(alloca, zero)?;

            if let Some(slot) = local.slot() {
                self.named_allocas.insert(slot, alloca);
            }
        }

        for block in &function.blocks {
            self.builder.position_at_end(self.block(block.id)?);

            for instruction in &block.instructions {
                gen_instruction(self, instruction)?;
            }

            gen_terminator(self, &block.terminator, function)?;
        }

        Ok(())
    }

    /// Runs the LLVM verifier over the module.
    fn verify(&self) -> Result<(), Error> {
        self.module.verify().map_err(|message| {
            Error::unlocated(ErrorImpl::Codegen {
                message: message.to_string(),
            })
        })
    }

    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }
}

/// Generates the LLVM IR text for a compilation unit.
///
/// This is the primary entry point for code generation. It:
/// 1. Declares the runtime functions, every function of the unit and the
///    sibling functions it calls
/// 2. Generates each function body
/// 3. Verifies the module
///
/// No target triple is set, so the output is identical on every host; the
/// backend supplies the target.
///
/// # Returns
///
/// The textual module, or an internal error if generation or verification fails.
#[tracing::instrument(level = "debug", skip_all, fields(unit = %unit.name))]
pub fn compile_unit(unit: &CompilationUnit) -> Result<String, Error> {
    let context = Context::create();
    let mut compiler = Compiler::new(&context, &unit.name);

    compiler.create_external_functions();

    for function in &unit.functions {
        compiler.declare_function(function)?;
    }
    for signature in &unit.externs {
        compiler.declare_extern(signature)?;
    }

    for function in &unit.functions {
        compiler.gen_function(function)?;
        debug!(function = %function.name, "generated function");
    }

    compiler.verify()?;
    Ok(compiler.print_to_string())
}
