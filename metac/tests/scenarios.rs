//! End-to-end scenarios: the bundled grammars are compiled with the
//! bootstrap metacompiler and the emitted programs are loaded and run.

use metac_assembly::{load_program, metacompiler};
use metac_core::{Program, render};
use metac_processor::{ExecutionError, ExecutionOptions, Machine};
use pretty_assertions::assert_eq;

const AEXP_GRAMMAR: &str = include_str!("../../grammars/aexp.meta");
const METAC_GRAMMAR: &str = include_str!("../../grammars/metac.meta");

/// Compiles a grammar with the bootstrap metacompiler and returns the
/// emitted program text.
fn compile(grammar: &str) -> String {
    let mut machine = Machine::new(metacompiler(), grammar);
    render::render(&machine.run().expect("grammar compiles"))
}

fn aexp_compiler() -> Program {
    load_program(&compile(AEXP_GRAMMAR)).expect("emitted program loads")
}

fn run(program: &Program, input: &str) -> Result<String, ExecutionError> {
    let mut machine = Machine::new(program, input);
    Ok(render::render(&machine.run()?))
}

// AEXP SCENARIOS
// ================================================================================================

#[test]
fn empty_aexp_program_compiles_to_entry_and_halt() {
    let compiler = aexp_compiler();
    assert_eq!(run(&compiler, "BEGIN END").unwrap(), "(ADR, 'program'),\n(END,),\n");
}

#[test]
fn single_assignment_compiles_to_postfix() {
    let compiler = aexp_compiler();
    assert_eq!(
        run(&compiler, "BEGIN x := 2 + 3 END").unwrap(),
        "(ADR, 'program'),\n(LITERAL, 2),\n(LITERAL, 3),\n(ADD,),\n(STORE, 'x'),\n(END,),\n",
    );
}

#[test]
fn precedence_and_unary_minus_compile_in_evaluation_order() {
    let compiler = aexp_compiler();
    assert_eq!(
        run(&compiler, "BEGIN y := 1 + 2 * -3 END").unwrap(),
        "(ADR, 'program'),\n(LITERAL, 1),\n(LITERAL, 2),\n(LITERAL, 3),\n(NEG,),\n\
         (MUL,),\n(ADD,),\n(STORE, 'y'),\n(END,),\n",
    );
}

#[test]
fn syntax_error_is_anchored_at_the_farthest_match() {
    let compiler = aexp_compiler();
    let err = run(&compiler, "BEGIN x := 2 + END").unwrap_err();
    assert_eq!(
        err.to_string(),
        "BEGIN x := 2 + \n***ERROR: Syntax error\n***HERE:\nEND ...\n\
         in <primary> in <factor> in <term> in <aexp> in <st> in <program>",
    );
}

#[test]
fn packrat_cache_does_not_change_emitted_code() {
    let compiler = aexp_compiler();
    let input = "BEGIN a := 1 + 2 * 3 b := a ^ 2 END";

    let mut cached = Machine::new(&compiler, input);
    let cached_out = render::render(&cached.run().unwrap());

    let mut uncached =
        Machine::with_options(&compiler, input, ExecutionOptions::new().with_packrat(false));
    let uncached_out = render::render(&uncached.run().unwrap());

    assert_eq!(cached_out, uncached_out);
    assert!(cached.stats().rule_calls() < uncached.stats().rule_calls());
}

// SELF-HOSTING
// ================================================================================================

#[test]
fn emitted_programs_carry_the_list_margin() {
    // the metacompiler's program rule opens with INDENT, so emitted items
    // sit four columns in
    let emitted = compile(AEXP_GRAMMAR);
    assert!(emitted.starts_with("    (ADR, 'program'),\n"));
    assert!(emitted.ends_with("    (END,),\n"));
}

#[test]
fn compiling_the_metacompiler_reaches_a_fixed_point() {
    let first = compile(METAC_GRAMMAR);
    let child = load_program(&first).expect("compiled metacompiler loads");

    let mut machine = Machine::new(&child, METAC_GRAMMAR);
    let second = render::render(&machine.run().expect("child compiles the grammar"));

    assert_eq!(first, second);
}

#[test]
fn compiled_metacompiler_defines_the_dialect_rules() {
    let program = load_program(&compile(METAC_GRAMMAR)).unwrap();
    for rule in ["program", "st", "ex1", "ex2", "ex3", "output", "string", "*whitespace*"] {
        assert!(program.defines(rule), "missing rule {rule}");
    }
}
