use metac_core::ProgramError;
use miette::Diagnostic;
use thiserror::Error;

// ASSEMBLY ERROR
// ================================================================================================

/// Any failure while loading a wire-format program.
#[derive(Debug, Error, Diagnostic)]
pub enum AssemblyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Program(#[from] ProgramError),
}

// PARSE ERROR
// ================================================================================================

/// A syntactic failure in the wire-format text itself.
#[derive(Debug, Error, Diagnostic)]
#[error("parse error at line {line}, column {column}: {kind}")]
#[diagnostic(code(metac::assembly::parse))]
pub struct ParseError {
    /// 1-based line of the offending character.
    pub line: usize,
    /// 1-based column of the offending character.
    pub column: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("expected a label or an instruction, found '{0}'")]
    UnexpectedChar(char),

    #[error("expected {expected}, found end of input")]
    UnexpectedEof { expected: &'static str },

    #[error("expected {expected}, found '{found}'")]
    Expected { expected: &'static str, found: char },

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),

    #[error("invalid \\u escape '{0}'")]
    InvalidUnicodeEscape(String),

    #[error(transparent)]
    BadInstruction(ProgramError),
}
