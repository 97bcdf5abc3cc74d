//! The `check` subcommand: run the pipeline without emitting.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use super::compile;

/// Parses and analyzes a package, reporting errors without writing any
/// output.
///
/// ## Errors
///
/// Returns an error for I/O problems; compiler errors exit nonzero
/// after printing the diagnostic.
pub fn run(manifest: &PathBuf, include: &[PathBuf]) -> Result<ExitCode> {
    match compile(manifest, include)? {
        Ok(compiled) => {
            log::info!(
                "package '{}': {} file(s) checked",
                compiled.name,
                compiled.own_files.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(code) => Ok(code),
    }
}
