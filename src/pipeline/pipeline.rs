use std::{fmt::Display, path::Path, str::FromStr, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    ast::ast::Program,
    compiler::compiler::compile_unit,
    errors::errors::{Diagnostic, Error, ErrorImpl},
    ir::builder::build_unit,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::{collect_signatures, type_check, ExportedSignature},
};

use super::backend::{Backend, IrModule};

/// Furthest point a unit reached. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Parsed,
    TypeChecked,
    Lowered,
    CodeGenerated,
    Linked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum OptLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
}

impl OptLevel {
    /// The flag passed to `llc`.
    pub fn flag(&self) -> String {
        format!("-O{}", self)
    }
}

impl Display for OptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            OptLevel::O0 => 0,
            OptLevel::O1 => 1,
            OptLevel::O2 => 2,
            OptLevel::O3 => 3,
        };
        write!(f, "{}", level)
    }
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches(['O', 'o']) {
            "0" => Ok(OptLevel::O0),
            "1" => Ok(OptLevel::O1),
            "2" => Ok(OptLevel::O2),
            "3" => Ok(OptLevel::O3),
            _ => Err(format!("invalid optimization level {:?}, expected 0 to 3", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub opt_level: OptLevel,
    /// Target triple forwarded to the backend; the host's when `None`.
    pub target: Option<String>,
    /// Emit nothing for a unit with any diagnostic, instead of omitting
    /// only the failing declarations.
    pub fail_whole_unit: bool,
}

/// One source file to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SourceUnit {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    pub unit: String,
    /// `None` when the source did not parse.
    pub stage: Option<Stage>,
    pub ir: Option<String>,
    /// In declaration order, one per failing declaration.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    fn failed(unit: &str, stage: Option<Stage>, diagnostics: Vec<Diagnostic>) -> Self {
        CompilationResult {
            unit: unit.to_string(),
            stage,
            ir: None,
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty() && self.ir.is_some()
    }
}

/// Name to report an internal error under: the function it occurred in,
/// or the unit.
fn internal_declaration(unit: &str, error: &Error) -> String {
    match error.get_internal() {
        ErrorImpl::UnreachableCode { function, .. } => function.clone(),
        _ => unit.to_string(),
    }
}

/// Signatures exported by every unit except the one at `index`.
fn sibling_signatures(signatures: &[Vec<ExportedSignature>], index: usize) -> Vec<ExportedSignature> {
    signatures
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .flat_map(|(_, exported)| exported.iter().cloned())
        .collect()
}

fn parse_source(unit: &str, source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some(unit.to_string()))?;
    parse(tokens, Arc::new(unit.to_string()))
}

/// Sequences type checking, lowering and code generation for compilation units.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: CompileOptions,
}

impl Pipeline {
    pub fn new(options: CompileOptions) -> Self {
        Pipeline { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self, unit: &str, source: &str) -> CompilationResult {
        self.compile_with_externs(unit, source, &[])
    }

    /// Compiles one source file against the signatures of sibling units.
    pub fn compile_with_externs(&self, unit: &str, source: &str, externs: &[ExportedSignature]) -> CompilationResult {
        match parse_source(unit, source) {
            Ok(program) => self.compile_program(unit, &program, externs),
            Err(error) => {
                debug!(unit, %error, "syntax error");
                CompilationResult::failed(unit, None, vec![Diagnostic::from_error(unit, &error)])
            }
        }
    }

    /// Compiles an already parsed program.
    #[tracing::instrument(level = "debug", skip(self, program, externs))]
    pub fn compile_program(&self, unit: &str, program: &Program, externs: &[ExportedSignature]) -> CompilationResult {
        let checked = type_check(program, externs);
        let mut diagnostics = checked.diagnostics.clone();
        debug!(diagnostics = diagnostics.len(), "type checked");

        if self.options.fail_whole_unit && !diagnostics.is_empty() {
            return CompilationResult::failed(unit, Some(Stage::TypeChecked), diagnostics);
        }

        let lowered = match build_unit(unit, checked) {
            Ok(lowered) => lowered,
            Err(error) => {
                warn!(%error, "lowering failed");
                diagnostics.push(Diagnostic::from_error(&internal_declaration(unit, &error), &error));
                return CompilationResult::failed(unit, Some(Stage::TypeChecked), diagnostics);
            }
        };
        debug!(functions = lowered.functions.len(), "lowered");

        match compile_unit(&lowered) {
            Ok(ir) => CompilationResult {
                unit: unit.to_string(),
                stage: Some(Stage::CodeGenerated),
                ir: Some(ir),
                diagnostics,
            },
            Err(error) => {
                warn!(%error, "code generation failed");
                diagnostics.push(Diagnostic::from_error(&internal_declaration(unit, &error), &error));
                CompilationResult::failed(unit, Some(Stage::Lowered), diagnostics)
            }
        }
    }

    /// Compiles several units in parallel.
    ///
    /// Every unit is parsed and checked before any code is generated, so
    /// each unit may call functions of the others. A unit only exports the
    /// functions that passed checking, and nothing when `fail_whole_unit`
    /// rejects it. Results come back in input order.
    #[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
    pub fn compile_batch(&self, units: &[SourceUnit]) -> Vec<CompilationResult> {
        let programs: Vec<Result<Program, Error>> = units
            .par_iter()
            .map(|unit| parse_source(&unit.name, &unit.source))
            .collect();

        let signatures = Arc::new(self.finalize_signatures(&programs));

        units
            .par_iter()
            .zip(programs.par_iter())
            .enumerate()
            .map(|(index, (unit, program))| match program {
                Ok(program) => self.compile_program(&unit.name, program, &sibling_signatures(&signatures, index)),
                Err(error) => CompilationResult::failed(
                    &unit.name,
                    None,
                    vec![Diagnostic::from_error(&unit.name, error)],
                ),
            })
            .collect()
    }

    /// Exported signatures of every unit, once no unit loses a function to
    /// a sibling's failure.
    ///
    /// Starts from every declared signature and rechecks each unit against
    /// its siblings' exports until nothing changes. Removing an export can
    /// only remove more, so the loop terminates.
    fn finalize_signatures(&self, programs: &[Result<Program, Error>]) -> Vec<Vec<ExportedSignature>> {
        let mut exported: Vec<Vec<ExportedSignature>> = programs
            .iter()
            .map(|program| program.as_ref().map(collect_signatures).unwrap_or_default())
            .collect();

        for round in 1.. {
            let next: Vec<Vec<ExportedSignature>> = programs
                .par_iter()
                .enumerate()
                .map(|(index, program)| match program {
                    Ok(program) => self.checked_exports(program, &sibling_signatures(&exported, index)),
                    Err(_) => vec![],
                })
                .collect();

            if next == exported {
                debug!(round, "signatures finalized");
                break;
            }
            exported = next;
        }

        exported
    }

    fn checked_exports(&self, program: &Program, externs: &[ExportedSignature]) -> Vec<ExportedSignature> {
        let checked = type_check(program, externs);

        if self.options.fail_whole_unit && !checked.diagnostics.is_empty() {
            return vec![];
        }
        checked.exported_signatures()
    }

    /// Hands the IR of every result to `backend`, producing one executable.
    /// Results are marked `Linked` on success.
    pub fn link(&self, results: &mut [CompilationResult], backend: &dyn Backend, output: &Path) -> Result<(), Error> {
        let modules: Vec<IrModule<'_>> = results
            .iter()
            .filter_map(|result| {
                result.ir.as_deref().map(|ir| IrModule {
                    name: &result.unit,
                    ir,
                })
            })
            .collect();

        backend.link(&modules, &self.options, output)?;

        for result in results.iter_mut().filter(|result| result.ir.is_some()) {
            result.stage = Some(Stage::Linked);
        }
        Ok(())
    }
}
