//! Bine CLI
//!
//! Command-line interface for the Bine programming language: loads a
//! package manifest, runs the compiler pipeline, and writes the
//! generated interface, header and source files.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// The Bine programming language compiler driver.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a package and write its generated output.
    Build {
        /// The package manifest.
        #[clap(long, default_value = "bine.json")]
        manifest: PathBuf,

        /// Directories searched for required packages' interfaces.
        #[clap(short = 'I', long = "include")]
        include: Vec<PathBuf>,

        /// The output directory.
        #[clap(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Parse and analyze a package without emitting.
    Check {
        /// The package manifest.
        #[clap(long, default_value = "bine.json")]
        manifest: PathBuf,

        /// Directories searched for required packages' interfaces.
        #[clap(short = 'I', long = "include")]
        include: Vec<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    match &args.command {
        Command::Build { manifest, include, output } => {
            commands::build::run(manifest, include, output)
        }
        Command::Check { manifest, include } => commands::check::run(manifest, include),
    }
}
