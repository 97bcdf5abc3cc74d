//! Driver subcommands.

pub mod build;
pub mod check;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bine_analyzer::Analysis;
use bine_ast::Ast;
use bine_ast::nodes::NodeId;
use bine_source::SourceManager;

use crate::manifest::{Manifest, find_interface};

/// The front half of the pipeline shared by every subcommand: load the
/// manifest, parse the required packages' interfaces and this package's
/// sources, and run semantic analysis.
pub struct Compiled {
    /// The arena with every parsed file.
    pub ast: Ast,
    /// All registered source files.
    pub sources: SourceManager,
    /// The package's own files, stem and file node, in compile order.
    pub own_files: Vec<(String, NodeId)>,
    /// The analysis result.
    pub analysis: Analysis,
    /// The package name.
    pub name: String,
}

/// Parses and analyzes a package, printing any compiler error in the
/// standard diagnostic format.
///
/// ## Errors
///
/// Returns an error for I/O and manifest problems; compiler errors are
/// printed and reported through the `Ok(Err(ExitCode))` side.
pub fn compile(
    manifest_path: &PathBuf,
    include: &[PathBuf],
) -> Result<Result<Compiled, ExitCode>> {
    let manifest = Manifest::load(manifest_path)?;
    let base = manifest_path.parent().map(PathBuf::from).unwrap_or_default();

    let mut sources = SourceManager::new();
    let mut ast = Ast::new();
    let mut all_files = Vec::new();
    let mut own_files = Vec::new();

    // Required packages come first, through their interface files, so
    // the root scope holds their declarations before ours resolve.
    for required in &manifest.requires {
        let Some(path) = find_interface(required, include) else {
            let error = bine_analyzer::CompileError::FileNotFound {
                path: format!("{required}.bih"),
            };
            eprintln!("{}", error.render(&sources));
            return Ok(Err(ExitCode::FAILURE));
        };
        let file = match parse_one(&mut sources, &mut ast, &path) {
            Ok(file) => file,
            Err(code) => return Ok(Err(code)),
        };
        all_files.push(file);
    }

    for source in &manifest.sources {
        let path = base.join(source);
        let file = match parse_one(&mut sources, &mut ast, &path) {
            Ok(file) => file,
            Err(code) => return Ok(Err(code)),
        };
        all_files.push(file);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        own_files.push((stem, file));
    }

    match bine_analyzer::analyze(&mut ast, &all_files) {
        Ok(analysis) => Ok(Ok(Compiled {
            ast,
            sources,
            own_files,
            analysis,
            name: manifest.name,
        })),
        Err(error) => {
            eprintln!("{}", error.render(&sources));
            Ok(Err(ExitCode::FAILURE))
        }
    }
}

/// Reads and parses one source file, printing errors in the standard
/// format.
fn parse_one(
    sources: &mut SourceManager,
    ast: &mut Ast,
    path: &PathBuf,
) -> Result<NodeId, ExitCode> {
    let Ok(content) = std::fs::read_to_string(path) else {
        let error = bine_analyzer::CompileError::FileNotFound {
            path: path.display().to_string(),
        };
        eprintln!("{}", error.render(sources));
        return Err(ExitCode::FAILURE);
    };

    let name = path.display().to_string();
    let id = sources.add_file_with_path(name, path.clone(), content);
    let file = sources.get_file(id).cloned().unwrap_or_else(|| {
        bine_source::SourceFile::new(id, path.display().to_string(), String::new())
    });

    match bine_parser::parse_file(ast, &file) {
        Ok(node) => Ok(node),
        Err(error) => {
            eprintln!(
                "{}: error: {error}",
                sources.format_location(error.loc())
            );
            let quoted = sources.quote(error.loc());
            if !quoted.is_empty() {
                eprint!("note: in\n{quoted}");
            }
            Err(ExitCode::FAILURE)
        }
    }
}
