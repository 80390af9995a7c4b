use core::fmt;

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

// EXECUTION ERROR
// ================================================================================================

/// Failures surfaced by a machine run.
///
/// Two kinds exist. *Input errors* — the `Syntax` variant — mean the parsed
/// text did not match the grammar; they are detected after the loop halts
/// with the success flag clear and are anchored at the farthest position any
/// match reached. Everything else is a *program error*: the compiled program
/// itself misbehaved, which indicates a compiler bug or a bad hand-written
/// program, never a problem with the user's input. Primitive match failures
/// are neither; they are ordinary control flow on the success flag.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutionError {
    #[error("{0}")]
    #[diagnostic(code(metac::execution::syntax))]
    Syntax(FailureReport),

    #[error("{0}")]
    #[diagnostic(
        code(metac::execution::unbound_variable),
        help("STORE binds a variable only within the current rule activation")
    )]
    UnboundVariable(FailureReport),

    #[error("{opcode} found no open scope to close")]
    #[diagnostic(code(metac::execution::scope_underflow))]
    ScopeUnderflow { opcode: &'static str },

    #[error("{opcode} closed a {found} scope where a {expected} scope was open")]
    #[diagnostic(code(metac::execution::scope_mismatch))]
    ScopeMismatch {
        opcode: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("R executed with no rule activation to return from")]
    #[diagnostic(code(metac::execution::return_underflow))]
    ReturnUnderflow,

    #[error("no such label: '{0}'")]
    #[diagnostic(code(metac::execution::undefined_label))]
    UndefinedLabel(Box<str>),

    #[error("execution ran past the final instruction")]
    #[diagnostic(
        code(metac::execution::ran_off_end),
        help("generated programs terminate with `(END,),`")
    )]
    RanOffEnd,

    #[error("call depth exceeded the configured limit of {0} frames")]
    #[diagnostic(code(metac::execution::call_depth))]
    CallDepthExceeded(usize),

    #[error("expression stack exceeded the configured limit of {0} frames")]
    #[diagnostic(code(metac::execution::expr_depth))]
    ExprDepthExceeded(usize),

    #[error("exceeded the allowed number of execution steps ({0})")]
    #[diagnostic(code(metac::execution::step_limit))]
    StepLimitExceeded(u64),

    #[error("a program has already been executed by this machine")]
    #[diagnostic(code(metac::execution::already_executed))]
    AlreadyExecuted,
}

// FAILURE REPORT
// ================================================================================================

/// A position-anchored diagnostic block.
///
/// Rendered in the fixed shape consumers of the tool expect:
///
/// ```text
/// <up-to-60 chars before the anchor>
/// ***ERROR: <message>
/// ***HERE:
/// <up-to-60 chars from the anchor> ...
/// in <rule_n> in <rule_n-1> ... in <rule_1>
/// ```
///
/// Syntax errors are anchored at the high-water mark with the rule chain
/// captured when that mark was set; internal reports are anchored at the
/// current position with the live caller chain and carry a leading `... ` on
/// the first excerpt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// The `***ERROR:` message line.
    pub message: String,
    /// Up to 60 characters of input before the anchor.
    pub before: String,
    /// Up to 60 characters of input from the anchor on.
    pub after: String,
    /// Caller-chain rule names, deepest first.
    pub rules: Vec<String>,
    /// Whether this is an internal report (program error).
    pub internal: bool,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.internal {
            f.write_str("... ")?;
        }
        writeln!(f, "{}", self.before)?;
        writeln!(f, "***ERROR: {}", self.message)?;
        writeln!(f, "***HERE:")?;
        write!(f, "{} ...", self.after)?;
        if !self.rules.is_empty() {
            write!(f, "\n{}", self.rules.iter().map(|rule| format!("in <{rule}>")).join(" "))?;
        }
        Ok(())
    }
}

// TESTS
// ================================================================================================
