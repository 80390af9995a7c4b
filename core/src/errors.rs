use miette::Diagnostic;
use thiserror::Error;

// PROGRAM ERROR
// ================================================================================================

/// A malformed program, detected while the program is being built.
///
/// Label resolution is eager: every branch and call target is checked when the
/// [`Program`](crate::Program) is constructed, so an unknown label is reported
/// before execution begins rather than when the branch is first taken.
#[derive(Debug, Error, Diagnostic)]
pub enum ProgramError {
    #[error("program contains no instructions")]
    #[diagnostic(code(metac::program::empty))]
    Empty,

    #[error("program must begin with an ADR or CALL instruction, found {found}")]
    #[diagnostic(
        code(metac::program::entry),
        help("emitted programs open with `(ADR, 'rule'),`")
    )]
    InvalidEntry { found: String },

    #[error("label '{0}' is defined more than once")]
    #[diagnostic(code(metac::program::duplicate_label))]
    DuplicateLabel(Box<str>),

    #[error("no such label: '{label}' (referenced by {opcode})")]
    #[diagnostic(code(metac::program::undefined_label))]
    UndefinedLabel { label: Box<str>, opcode: &'static str },

    #[error("unknown opcode {opcode}")]
    #[diagnostic(code(metac::program::unknown_opcode))]
    UnknownOpcode { opcode: Box<str> },

    #[error("opcode {opcode} requires an operand")]
    #[diagnostic(code(metac::program::missing_operand))]
    MissingOperand { opcode: Box<str> },

    #[error("opcode {opcode} does not take an operand")]
    #[diagnostic(code(metac::program::unexpected_operand))]
    UnexpectedOperand { opcode: Box<str> },
}
