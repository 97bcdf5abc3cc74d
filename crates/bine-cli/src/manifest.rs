//! Package manifest loading.
//!
//! A package is described by a small JSON manifest listing its name,
//! source files, data files, and required packages. The driver reads it
//! with serde; the compiler core never touches the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

/// The package manifest (`bine.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// The package name.
    pub name: String,
    /// The source files of the package, in compile order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Header (interface) files shipped with the package.
    #[serde(default)]
    pub headers: Vec<PathBuf>,
    /// Data files shipped with the package.
    #[serde(default)]
    pub data: Vec<PathBuf>,
    /// Names of required packages, resolved on the include path.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl Manifest {
    /// Loads a manifest from disk.
    ///
    /// ## Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read manifest '{}'", path.display()))?;
        let manifest: Self = serde_json::from_str(&text)
            .with_context(|| format!("could not parse manifest '{}'", path.display()))?;
        Ok(manifest)
    }
}

/// Finds the interface file of a required package on the include path.
#[must_use]
pub fn find_interface(name: &str, include: &[PathBuf]) -> Option<PathBuf> {
    for dir in include {
        let candidate = dir.join(format!("{name}.bih"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn loads_a_minimal_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bine.json");
        let mut file = fs::File::create(&path).expect("create");
        writeln!(
            file,
            "{{\"name\": \"demo\", \"sources\": [\"model.bi\"], \"requires\": [\"standard\"]}}"
        )
        .expect("write");

        let manifest = Manifest::load(&path).expect("load");
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.sources, vec![PathBuf::from("model.bi")]);
        assert_eq!(manifest.requires, vec!["standard".to_string()]);
        assert!(manifest.headers.is_empty());
    }
}
