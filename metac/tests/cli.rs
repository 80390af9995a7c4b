//! CLI behavior: compile mode, run mode, exit codes, stderr diagnostics.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn metac() -> Command {
    Command::cargo_bin("metac").unwrap()
}

#[test]
fn compiles_a_grammar_to_stdout() {
    metac()
        .arg("../grammars/aexp.meta")
        .assert()
        .success()
        .stdout(predicate::str::contains("(ADR, 'program'),"))
        .stdout(predicate::str::contains("(END,),"));
}

#[test]
fn runs_an_emitted_program_over_an_input() {
    let program_path = std::env::temp_dir().join("metac_cli_aexp.pm");
    let input_path = std::env::temp_dir().join("metac_cli_empty.aexp");

    let compiled = metac().arg("../grammars/aexp.meta").output().unwrap();
    assert!(compiled.status.success());
    fs::write(&program_path, &compiled.stdout).unwrap();
    fs::write(&input_path, "BEGIN END").unwrap();

    metac()
        .arg("--program")
        .arg(&program_path)
        .arg(&input_path)
        .assert()
        .success()
        .stdout("(ADR, 'program'),\n(END,),\n");

    fs::remove_file(&program_path).unwrap();
    fs::remove_file(&input_path).unwrap();
}

#[test]
fn syntax_errors_exit_nonzero_with_the_diagnostic_block() {
    let program_path = std::env::temp_dir().join("metac_cli_aexp_err.pm");
    let input_path = std::env::temp_dir().join("metac_cli_bad.aexp");

    let compiled = metac().arg("../grammars/aexp.meta").output().unwrap();
    assert!(compiled.status.success());
    fs::write(&program_path, &compiled.stdout).unwrap();
    fs::write(&input_path, "BEGIN x := 2 + END").unwrap();

    metac()
        .arg("--program")
        .arg(&program_path)
        .arg(&input_path)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("***ERROR: Syntax error"))
        .stderr(predicate::str::contains("***HERE:"))
        .stderr(predicate::str::contains("in <aexp>"));

    fs::remove_file(&program_path).unwrap();
    fs::remove_file(&input_path).unwrap();
}

#[test]
fn malformed_grammars_exit_nonzero() {
    let input_path = std::env::temp_dir().join("metac_cli_bad.meta");
    fs::write(&input_path, "BEGIN <program> <program> ::= 'BEGIN' END").unwrap();

    metac()
        .arg(&input_path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("***ERROR: Syntax error"));

    fs::remove_file(&input_path).unwrap();
}

#[test]
fn unreadable_input_is_reported() {
    metac()
        .arg("definitely_not_here.meta")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}
