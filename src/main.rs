//! The `mdcc` CLI driver. Argument parsing is a single positional input
//! path, handled directly against `std::env::args`: the core spec
//! scopes CLI argument parsing out, and nothing in this crate's
//! dependency stack reaches for a flag-parsing crate, so there is no
//! ecosystem convention to defer to here (§6). Output always goes to
//! standard output, matching the original reference driver, which
//! never exercises its own emitter's file-output path; `Emitter::to_file`
//! remains available to library embedders and is exercised by the
//! integration tests.

use std::process::ExitCode;

use mdcc::emit::Emitter;
use mdcc::{Error, Result};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mdcc: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("mdcc", String::as_str).to_string();
    match args.as_slice() {
        [_, input] => compile_file(input),
        _ => Err(Error::Cli(format!("usage: {program} <input.mdc>"))),
    }
}

fn compile_file(input: &str) -> Result<()> {
    tracing::info!(input, "compiling");
    let src = std::fs::read_to_string(input)?;
    mdcc::compile(&src, Emitter::stdout())
}
