//! The `build` subcommand: run the full pipeline and write outputs.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bine_emitter::{emit_package, write_if_changed};

use super::compile;

/// Compiles a package and writes its interface, header and sources into
/// the output directory. Files are rewritten only when their content
/// changed, so downstream builds can skip unchanged translation units.
///
/// ## Errors
///
/// Returns an error for I/O problems; compiler errors exit nonzero
/// after printing the diagnostic.
pub fn run(manifest: &PathBuf, include: &[PathBuf], output: &PathBuf) -> Result<ExitCode> {
    let compiled = match compile(manifest, include)? {
        Ok(compiled) => compiled,
        Err(code) => return Ok(code),
    };

    let emitted = emit_package(
        &compiled.ast,
        &compiled.analysis,
        &compiled.name,
        &compiled.own_files,
    );

    let mut written = 0usize;
    let interface = output.join(format!("{}.bih", compiled.name));
    if write_if_changed(&interface, &emitted.interface)? {
        written += 1;
    }
    let header = output.join(format!("{}.hpp", compiled.name));
    if write_if_changed(&header, &emitted.header)? {
        written += 1;
    }
    for (stem, text) in &emitted.sources {
        let path = output.join(format!("{stem}.cpp"));
        if write_if_changed(&path, text)? {
            written += 1;
        }
    }

    log::info!(
        "package '{}': {} output file(s), {} rewritten",
        compiled.name,
        emitted.sources.len() + 2,
        written
    );
    Ok(ExitCode::SUCCESS)
}
