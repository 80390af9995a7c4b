//! Loader for the textual instruction-stream format ("wire format") that the
//! metacompiler emits and the parsing machine executes.
//!
//! A program on the wire is a sequence of items, one per line by convention:
//! labels as `'name',` and instructions as `(OPCODE,),` or `(OPCODE, 'arg'),`.
//! String operands use single quotes with backslash escapes. Loading parses
//! the stream, appends the built-in `*whitespace*` rule when the program does
//! not define one, and validates the result into a
//! [`Program`](metac_core::Program).
//!
//! The crate also embeds the bootstrap metacompiler: the compiled form of the
//! metacompiler's own grammar, in the same wire format, available through
//! [`metacompiler`].

mod bootstrap;
mod errors;
mod escape;
mod parser;
mod whitespace;

use metac_core::Program;

// RE-EXPORTS
// ================================================================================================

pub use bootstrap::metacompiler;
pub use errors::{AssemblyError, ParseError, ParseErrorKind};
pub use parser::parse_items;
pub use whitespace::{WHITESPACE_RULE, ensure_whitespace};

// PROGRAM LOADING
// ================================================================================================

/// Loads a program from wire-format text.
///
/// Parses the item stream, injects the canonical `*whitespace*` definition if
/// the program does not supply its own, and validates labels eagerly.
///
/// # Errors
/// Returns an error if the text does not parse, or if the parsed program is
/// malformed (bad entry, duplicate label, undefined branch or call target).
#[tracing::instrument(skip_all)]
pub fn load_program(text: &str) -> Result<Program, AssemblyError> {
    let mut items = parser::parse_items(text)?;
    whitespace::ensure_whitespace(&mut items);
    let program = Program::new(items)?;
    tracing::debug!(items = program.len(), "loaded program");
    Ok(program)
}
