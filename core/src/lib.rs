//! Core definitions shared by the metac toolchain: the parsing-machine
//! instruction set, the program container with its resolved label table, the
//! output-fragment model with its consolidation rule, and the renderer that
//! turns a fragment tree into final text.

mod errors;
mod fragment;
mod instruction;
mod program;

pub mod render;

// RE-EXPORTS
// ================================================================================================

pub use errors::ProgramError;
pub use fragment::{Fragment, Value};
pub use instruction::Instruction;
pub use program::{Program, ProgramItem};
