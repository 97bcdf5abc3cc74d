//! C++ code emission for the Bine compiler.
//!
//! A package emits three kinds of output:
//!
//! - one interface file (`.bih`) in the surface syntax, for downstream
//!   packages to import;
//! - one header (`.hpp`) with the package's declarations in the target
//!   language;
//! - one source file (`.cpp`) per input file with the implementations,
//!   including the lowered fiber state machines.
//!
//! All output is built in memory; [`write_if_changed`] compares against
//! the file on disk and rewrites only on difference, so an unchanged
//! emission leaves timestamps alone and downstream builds skip work.

pub mod bih;
mod cpp;
pub mod mangle;
pub mod writer;

use std::fs;
use std::io;
use std::path::Path;

use bine_analyzer::Analysis;
use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId};
use cpp::CppGenerator;
use writer::Writer;

/// The in-memory output of emitting one package.
#[derive(Debug)]
pub struct Emitted {
    /// The target-language package header.
    pub header: String,
    /// The surface-syntax package interface.
    pub interface: String,
    /// One source file per input file, keyed by file stem.
    pub sources: Vec<(String, String)>,
}

/// Emits a resolved package.
///
/// `files` pairs each input file's stem (used to name its output) with
/// its parsed file node. Emission is deterministic: the same resolved
/// arena always produces identical bytes.
#[must_use]
pub fn emit_package(
    ast: &Ast,
    analysis: &Analysis,
    name: &str,
    files: &[(String, NodeId)],
) -> Emitted {
    let mut emitter = CppGenerator::new(ast, analysis);

    emitter.header.line("#pragma once");
    emitter.header.blank();
    emitter.header.line("#include <bine/runtime.hpp>");
    emitter.header.blank();
    emitter.header.line("namespace bine {");
    emitter.header.blank();

    // Forward declarations make declaration order irrelevant for
    // pointer members; base classes must still precede derived ones.
    let mut any_class = false;
    for (_, file) in files {
        for class in collect_classes(ast, *file) {
            let forward = format!("class {};", emitter.decl_cpp_name(class));
            emitter.header.line(forward);
            any_class = true;
        }
    }
    if any_class {
        emitter.header.blank();
    }

    let mut sources = Vec::with_capacity(files.len());
    for (stem, file) in files {
        emitter.source = Writer::new();
        emitter.source.line(format!("#include \"{name}.hpp\""));
        emitter.source.line("#include <cassert>");
        emitter.source.blank();
        emitter.emit_file(*file);
        let text = std::mem::take(&mut emitter.source).into_string();
        sources.push((stem.clone(), text));
        log::debug!("emitted {stem}.cpp");
    }

    emitter.header.line("}");

    Emitted {
        header: emitter.header.into_string(),
        interface: bih::emit_interface(ast, analysis, files),
        sources,
    }
}

/// The class declarations of a file, templates expanded to their
/// instantiations, in emission order.
fn collect_classes(ast: &Ast, file: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for stmt in ast.children(file) {
        if let AnyNode::ClassDecl(node) = &ast[stmt].data {
            if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                out.extend(node.instantiations.iter().copied());
            } else {
                out.push(stmt);
            }
        }
    }
    out
}

/// Writes a file only when its content differs from what is on disk.
///
/// Returns true when the file was (re)written. The content is compared
/// against the existing file first, so an identical emission leaves the
/// file untouched and `make`-style builds skip recompilation.
///
/// ## Errors
///
/// Returns any I/O error from reading or writing the file.
pub fn write_if_changed(path: &Path, content: &str) -> io::Result<bool> {
    match fs::read_to_string(path) {
        Ok(existing) if existing == content => return Ok(false),
        Ok(_) | Err(_) => {}
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_if_changed_skips_identical_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.hpp");

        assert!(write_if_changed(&path, "alpha\n").expect("first write"));
        assert!(!write_if_changed(&path, "alpha\n").expect("second write"));
        assert!(write_if_changed(&path, "beta\n").expect("third write"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "beta\n");
    }
}
