//! A single-pass, type-checked compiler from MiniDecaf to RISC-V 64-bit
//! assembly text. See each module for its slice of the pipeline:
//! `lexer`/`parser` build an `ast::Top`, `codegen` walks it once,
//! consulting `types` and `symbol`, and drives an `emit::Emitter`.

pub mod ast;
mod codegen;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod types;

pub use codegen::CodeGen;
pub use error::{Error, Result};

/// Compile `src` end to end, writing RISC-V assembly text through `emitter`.
pub fn compile(src: &str, emitter: emit::Emitter) -> Result<()> {
    let top = parser::parse_source(src)?;
    tracing::debug!(
        functions = top.funcs.len(),
        top_level_statements = top.top_level_stmts.len(),
        "parsed program"
    );
    CodeGen::new(emitter).compile(&top)
}
