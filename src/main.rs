use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::{Args, Parser, Subcommand};
use morelia::{
    display_error, init_tracing,
    pipeline::{
        backend::LlcBackend,
        pipeline::{CompilationResult, CompileOptions, OptLevel, Pipeline, SourceUnit},
    },
};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Compiles annotated Python to native code via LLVM")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct UnitOptions {
    /// Drop the whole file on any error instead of only the failing declarations
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Type-check files without generating code
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        unit: UnitOptions,
    },
    /// Write LLVM IR for each file
    Emit {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output path; only valid with a single input
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        unit: UnitOptions,
    },
    /// Compile and link files into an executable
    Build {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long, default_value = "a.out")]
        output: PathBuf,
        /// Optimization level passed to llc (0-3)
        #[arg(short = 'O', long = "opt-level", default_value = "0")]
        opt_level: OptLevel,
        /// Target triple passed to llc and the linker
        #[arg(long)]
        target: Option<String>,
        #[command(flatten)]
        unit: UnitOptions,
    },
}

fn read_units(files: &[PathBuf]) -> Result<Vec<SourceUnit>, String> {
    files
        .iter()
        .map(|file| {
            fs::read_to_string(file)
                .map(|source| SourceUnit::new(file.display().to_string(), source))
                .map_err(|error| format!("failed to read {}: {}", file.display(), error))
        })
        .collect()
}

/// Prints every diagnostic; returns whether there were any.
fn report(results: &[CompilationResult], units: &[SourceUnit]) -> bool {
    let mut failed = false;

    for (result, unit) in results.iter().zip(units) {
        for diagnostic in &result.diagnostics {
            display_error(diagnostic, &unit.source, Path::new(&unit.name));
            failed = true;
        }
    }

    failed
}

fn run(cli: Cli) -> Result<bool, String> {
    let start = Instant::now();

    let failed = match cli.command {
        Command::Check { files, unit } => {
            let units = read_units(&files)?;
            let pipeline = Pipeline::new(CompileOptions {
                fail_whole_unit: unit.strict,
                ..CompileOptions::default()
            });
            report(&pipeline.compile_batch(&units), &units)
        }
        Command::Emit { files, output, unit } => {
            if output.is_some() && files.len() > 1 {
                return Err(String::from("--output requires a single input file"));
            }

            let units = read_units(&files)?;
            let pipeline = Pipeline::new(CompileOptions {
                fail_whole_unit: unit.strict,
                ..CompileOptions::default()
            });
            let results = pipeline.compile_batch(&units);

            for (result, file) in results.iter().zip(&files) {
                if let Some(ir) = &result.ir {
                    let path = output.clone().unwrap_or_else(|| file.with_extension("ll"));
                    fs::write(&path, ir).map_err(|error| format!("failed to write {}: {}", path.display(), error))?;
                    info!("wrote {}", path.display());
                }
            }

            report(&results, &units)
        }
        Command::Build {
            files,
            output,
            opt_level,
            target,
            unit,
        } => {
            let units = read_units(&files)?;
            let pipeline = Pipeline::new(CompileOptions {
                opt_level,
                target,
                fail_whole_unit: unit.strict,
            });
            let mut results = pipeline.compile_batch(&units);

            if report(&results, &units) {
                true
            } else {
                pipeline
                    .link(&mut results, &LlcBackend::default(), &output)
                    .map_err(|error| format!("{}: {}", error.kind(), error))?;
                false
            }
        }
    };

    info!("finished in {:?}", start.elapsed());
    Ok(failed)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { Some("debug") } else { Some("warn") });

    match run(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
