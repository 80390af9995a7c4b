//! The metac parsing machine.
//!
//! A [`Machine`] executes a compiled grammar [`Program`] against an input
//! text: PEG-style ordered choice with checkpoint/rollback, output
//! construction with indentation markers, per-rule packrat memoization, and
//! farthest-failure tracking for diagnostics. Execution is strictly
//! sequential; rule recursion lives on explicit heap-resident stacks, never
//! on the host stack, with depths bounded by [`ExecutionOptions`].

mod cache;
mod errors;
mod machine;
mod options;


// RE-EXPORTS
// ================================================================================================

pub use errors::{ExecutionError, FailureReport};
pub use machine::{Machine, MachineStats};
pub use metac_core::{Fragment, Instruction, Program, ProgramItem, Value, render};
pub use options::ExecutionOptions;

// EXECUTOR
// ================================================================================================

/// Executes a program over an input text with default options and returns the
/// final return value, ready for [`render::render`].
///
/// # Errors
/// Returns an error if the parse fails (reported at the farthest position
/// reached), or if the program itself misbehaves (unbound variable, scope
/// mismatch, exceeded stack depth).
pub fn execute(program: &Program, input: &str) -> Result<Value, ExecutionError> {
    Machine::new(program, input).run()
}
