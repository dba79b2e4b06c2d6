use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info};

use crate::errors::errors::{Error, ErrorImpl};

use super::pipeline::CompileOptions;

/// One generated module handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct IrModule<'r> {
    pub name: &'r str,
    pub ir: &'r str,
}

/// Turns LLVM IR text into a native executable.
///
/// The optimization level and target are forwarded from `options`
/// unmodified; any failure is a single `BackendError`.
pub trait Backend: Send + Sync {
    fn link(&self, modules: &[IrModule<'_>], options: &CompileOptions, output: &Path) -> Result<(), Error>;
}

/// Runs `llc` on every module, then links the objects with a C compiler driver.
#[derive(Debug, Clone)]
pub struct LlcBackend {
    pub llc: PathBuf,
    pub linker: PathBuf,
}

impl Default for LlcBackend {
    fn default() -> Self {
        LlcBackend {
            llc: PathBuf::from("llc"),
            linker: PathBuf::from("clang"),
        }
    }
}

fn backend_error(message: String) -> Error {
    Error::unlocated(ErrorImpl::Backend { message })
}

fn run(command: &mut Command, tool: &str) -> Result<(), Error> {
    debug!(?command, "running {}", tool);

    let output = command
        .output()
        .map_err(|error| backend_error(format!("failed to run {}: {}", tool, error)))?;

    if !output.status.success() {
        return Err(backend_error(format!(
            "{} exited with {}: {}",
            tool,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

impl Backend for LlcBackend {
    #[tracing::instrument(level = "debug", skip_all, fields(output = %output.display()))]
    fn link(&self, modules: &[IrModule<'_>], options: &CompileOptions, output: &Path) -> Result<(), Error> {
        if modules.is_empty() {
            return Err(backend_error(String::from("no modules to link")));
        }

        let directory = tempfile::tempdir()
            .map_err(|error| backend_error(format!("failed to create a build directory: {}", error)))?;

        let mut objects = vec![];
        for (index, module) in modules.iter().enumerate() {
            let ir_path = directory.path().join(format!("{}.ll", index));
            let object_path = directory.path().join(format!("{}.o", index));

            fs::write(&ir_path, module.ir)
                .map_err(|error| backend_error(format!("failed to write IR for {}: {}", module.name, error)))?;

            let mut llc = Command::new(&self.llc);
            llc.arg(options.opt_level.flag());
            if let Some(target) = &options.target {
                llc.arg(format!("-mtriple={}", target));
            }
            llc.args(["-filetype=obj", "-relocation-model=pic"])
                .arg(&ir_path)
                .arg("-o")
                .arg(&object_path);
            run(&mut llc, "llc")?;

            objects.push(object_path);
        }

        let mut linker = Command::new(&self.linker);
        linker.args(["-fPIE", "-pie"]);
        if let Some(target) = &options.target {
            linker.arg(format!("--target={}", target));
        }
        linker.arg("-o").arg(output).args(&objects);
        run(&mut linker, "linker")?;

        info!(modules = modules.len(), "linked {}", output.display());
        Ok(())
    }
}
