//! Command-line front end.
//!
//! `metac <grammar>` compiles a META-style grammar with the bootstrap
//! metacompiler and writes the emitted parsing-machine program to stdout.
//! `metac --program <file.pm> <input>` instead loads a previously emitted
//! program and runs it over the input. Diagnostics go to stderr; the exit
//! code is zero exactly when the parse succeeded.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use metac_assembly::{AssemblyError, load_program, metacompiler};
use metac_core::{Program, Value, render};
use metac_processor::{ExecutionError, Machine};

// CLI
// ================================================================================================

/// Compile a META-style grammar, or run an emitted program over an input.
#[derive(Debug, Parser)]
#[command(name = "metac", version, about = "META-style metacompiler")]
struct Cli {
    /// Input file: a grammar to compile, or, with --program, the text to
    /// parse.
    #[arg(value_parser)]
    input_file: PathBuf,

    /// Run this emitted parsing-machine program over the input instead of
    /// compiling the input as a grammar.
    #[arg(short, long, value_parser)]
    program: Option<PathBuf>,
}

impl Cli {
    fn execute(&self) -> Result<(), CliError> {
        let input = read_to_string(&self.input_file)?;

        let value = match &self.program {
            Some(path) => {
                let text = read_to_string(path)?;
                let program = load_program(&text)?;
                tracing::debug!(program = %path.display(), input = %self.input_file.display(), "running emitted program");
                run(&program, &input)?
            },
            None => {
                tracing::debug!(grammar = %self.input_file.display(), "compiling grammar");
                run(metacompiler(), &input)?
            },
        };

        print!("{}", render::render(&value));
        Ok(())
    }
}

fn run(program: &Program, input: &str) -> Result<Value, CliError> {
    let mut machine = Machine::new(program, input);
    Ok(machine.run()?)
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|source| CliError::Io { path: path.display().to_string(), source })
}

// ERRORS
// ================================================================================================

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] AssemblyError),

    #[error("{0}")]
    Run(#[from] ExecutionError),
}

// ENTRY POINT
// ================================================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        },
    }
}
