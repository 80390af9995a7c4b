//! The bootstrap metacompiler.
//!
//! `bootstrap.pm` holds the compiled form of the metacompiler's own grammar
//! in the wire format — the same text the compiler emits when it compiles
//! that grammar. Running it over a grammar file yields the compiled form of
//! that grammar; running it over its own grammar reproduces it, which is the
//! fixed point that makes the system self-hosting.

use std::sync::OnceLock;

use metac_core::Program;

use crate::load_program;

static BOOTSTRAP: OnceLock<Program> = OnceLock::new();

/// Returns the bootstrap metacompiler program.
///
/// The embedded text is parsed and validated on first use and cached for the
/// lifetime of the process.
pub fn metacompiler() -> &'static Program {
    BOOTSTRAP.get_or_init(|| {
        let program = load_program(include_str!("bootstrap.pm"))
            .expect("embedded bootstrap program is well formed");
        tracing::debug!(items = program.len(), "bootstrap metacompiler loaded");
        program
    })
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use metac_core::{Instruction, ProgramItem};

    use super::metacompiler;
    use crate::WHITESPACE_RULE;

    #[test]
    fn bootstrap_loads_and_enters_at_program() {
        let program = metacompiler();
        assert_eq!(
            program.items()[0],
            ProgramItem::Inst(Instruction::Adr("program".into())),
        );
    }

    #[test]
    fn bootstrap_defines_the_dialect_rules() {
        let program = metacompiler();
        for rule in [
            "program",
            "st",
            "ex1",
            "ex2",
            "ex3",
            "quoted_symbol",
            "ex3yield",
            "output",
            "outlist",
            "out1",
            "ruleid",
            "id",
            "number",
            "string",
            "string_escape",
            "comment",
            WHITESPACE_RULE,
        ] {
            assert!(program.defines(rule), "missing rule {rule}");
        }
    }

    #[test]
    fn bootstrap_brings_its_own_whitespace() {
        // the grammar defines *whitespace* itself (comments in grammar
        // source), so the X-label fallback must not be appended
        let program = metacompiler();
        assert!(!program.defines("X124"));
    }
}
