//! The single diagnostic type produced by every fallible stage of the
//! compiler: lexing, parsing, type checking and code generation all fail
//! into this one enum. Per the error handling design, every variant is
//! fatal and carries no source location, only a human-readable message.

use thiserror::Error;

/// Crate-local result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A fatal compilation error. There is no recovery: the first error
/// reported aborts the compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed token stream (bad character, unterminated token, ...).
    #[error("lex error: {0}")]
    Lex(String),

    /// The token stream does not match the grammar.
    #[error("parse error: {0}")]
    Parse(String),

    /// An operator rule was violated, or an assignment/return/declaration
    /// type mismatch was found, or the destination of an assignment was
    /// an array, or a non-pointer was dereferenced.
    #[error("type error: {0}")]
    Type(String),

    /// An identifier was used before it was declared, `&` was applied to
    /// a non-variable, or an undeclared name was assigned to, or a name
    /// was redeclared in the same scope.
    #[error("scope error: {0}")]
    Scope(String),

    /// A call referenced an unknown function, passed the wrong number of
    /// arguments, or passed an argument of the wrong type.
    #[error("call error: {0}")]
    Call(String),

    /// The CLI was invoked with the wrong number of arguments.
    #[error("usage error: {0}")]
    Cli(String),

    /// Wraps an I/O failure reading the source file or writing assembly.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Error::Io(e.to_string()) }
}
