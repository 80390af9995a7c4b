use core::mem;
use std::collections::HashMap;

use metac_core::{Fragment, Instruction, Program, ProgramItem, Value};
use smallvec::SmallVec;

use crate::{
    cache::PackratCache,
    errors::{ExecutionError, FailureReport},
    options::ExecutionOptions,
};

mod ops;

// STACK FRAMES
// ================================================================================================

/// An expression-stack frame: one open scope.
#[derive(Debug)]
enum ExprFrame {
    /// A `CHECKPOINT` scope: saved input position and output list.
    Backtrack { pos: usize, output: Vec<Fragment> },
    /// A `BRA` group: output list only. Closing a group never touches the
    /// input position, so grouping output cannot undo input consumption.
    Group { output: Vec<Fragment> },
}

impl ExprFrame {
    fn kind(&self) -> &'static str {
        match self {
            Self::Backtrack { .. } => "backtracking",
            Self::Group { .. } => "group",
        }
    }
}

/// A call-stack frame: the caller state a rule activation restores on `R`.
#[derive(Debug)]
struct CallFrame {
    return_pc: Option<usize>,
    /// Label item index of the *caller's* rule.
    rule: Option<usize>,
    locals: HashMap<Box<str>, Value>,
}

/// The farthest position any match ever succeeded at, with the caller chain
/// captured at that moment (deepest last). Used solely to anchor syntax-error
/// diagnostics.
#[derive(Debug, Default)]
struct HighWaterMark {
    pos: usize,
    rules: SmallVec<[usize; 16]>,
}

// MACHINE STATISTICS
// ================================================================================================

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineStats {
    steps: u64,
    rule_calls: u64,
    cache_hits: u64,
}

impl MachineStats {
    /// Returns the number of instructions executed.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the number of rule bodies actually entered (cache misses).
    pub fn rule_calls(&self) -> u64 {
        self.rule_calls
    }

    /// Returns the number of rule invocations elided by the packrat cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }
}

// MACHINE
// ================================================================================================

/// The parsing machine: a register and stack machine executing a compiled
/// grammar program over an input text.
///
/// All recursion is explicit. `CALL`/`R` move activation records between the
/// registers and the heap-resident call stack; `CHECKPOINT`/`BRA` and their
/// closers do the same for backtracking scopes on the expression stack. The
/// host stack depth stays constant regardless of grammar nesting.
#[derive(Debug)]
pub struct Machine<'p> {
    program: &'p Program,
    input: Vec<char>,
    options: ExecutionOptions,

    // registers
    pos: usize,
    pc: Option<usize>,
    switch: bool,
    retval: Value,
    /// Label item index of the rule whose body is executing.
    rule: Option<usize>,
    locals: HashMap<Box<str>, Value>,
    output: Vec<Fragment>,
    gen_counter: u64,

    // stacks and caches
    expr_stack: Vec<ExprFrame>,
    call_stack: Vec<CallFrame>,
    cache: PackratCache,
    hwm: HighWaterMark,
    stats: MachineStats,
}

impl<'p> Machine<'p> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns a machine ready to run `program` over `input` with default
    /// options.
    pub fn new(program: &'p Program, input: &str) -> Self {
        Self::with_options(program, input, ExecutionOptions::default())
    }

    /// Returns a machine with explicit execution options.
    pub fn with_options(program: &'p Program, input: &str, options: ExecutionOptions) -> Self {
        Self {
            program,
            input: input.chars().collect(),
            options,
            pos: 0,
            pc: None,
            switch: false,
            retval: Value::empty(),
            rule: None,
            locals: HashMap::new(),
            output: Vec::new(),
            gen_counter: 1,
            expr_stack: Vec::new(),
            call_stack: Vec::new(),
            cache: PackratCache::default(),
            hwm: HighWaterMark::default(),
            stats: MachineStats::default(),
        }
    }

    // EXECUTION
    // --------------------------------------------------------------------------------------------

    /// Runs the program to halt and returns the final return value.
    ///
    /// The entry instruction executes with a nil return PC, so the entry
    /// rule's `R` halts the machine; a trailing `END` instruction (the
    /// terminator emitted for generated programs) is never reached on this
    /// path.
    ///
    /// # Errors
    /// Returns a syntax error if the machine halts with the success flag
    /// clear, anchored at the high-water mark; or a program error if the
    /// compiled program misbehaves (unbound variable, mismatched scope,
    /// exceeded limit).
    #[tracing::instrument(skip_all, fields(input_len = self.input.len()))]
    pub fn run(&mut self) -> Result<Value, ExecutionError> {
        if self.stats.steps != 0 {
            return Err(ExecutionError::AlreadyExecuted);
        }

        // Item 0 is validated to be ADR/CALL; it runs while PC is still nil,
        // which becomes the entry rule's return PC.
        let (_, entry) = self.fetch(0)?;
        self.step(entry)?;

        while let Some(next) = self.pc {
            let (at, inst) = self.fetch(next)?;
            self.pc = Some(at + 1);
            self.step(inst)?;
        }
        tracing::debug!(
            steps = self.stats.steps,
            rule_calls = self.stats.rule_calls,
            cache_hits = self.stats.cache_hits,
            matched = self.switch,
            "machine halted"
        );

        if self.switch {
            Ok(mem::take(&mut self.retval))
        } else {
            Err(ExecutionError::Syntax(self.report(
                self.hwm.pos,
                "Syntax error".to_string(),
                &self.hwm.rules,
                false,
            )))
        }
    }

    /// Returns the first instruction at or after `from`, skipping label
    /// items.
    fn fetch(&self, from: usize) -> Result<(usize, &'p Instruction), ExecutionError> {
        let items = self.program.items();
        let mut at = from;
        loop {
            match items.get(at) {
                Some(ProgramItem::Inst(inst)) => return Ok((at, inst)),
                Some(ProgramItem::Label(_)) => at += 1,
                None => return Err(ExecutionError::RanOffEnd),
            }
        }
    }

    fn step(&mut self, inst: &'p Instruction) -> Result<(), ExecutionError> {
        self.stats.steps += 1;
        if let Some(limit) = self.options.max_steps() {
            if self.stats.steps > limit {
                return Err(ExecutionError::StepLimitExceeded(limit));
            }
        }
        self.execute(inst)
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the counters accumulated so far.
    pub fn stats(&self) -> MachineStats {
        self.stats
    }

    /// Returns the current input position, in characters.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the success flag.
    pub fn succeeded(&self) -> bool {
        self.switch
    }

    /// Returns the number of open backtracking/group scopes.
    pub fn expression_depth(&self) -> usize {
        self.expr_stack.len()
    }

    /// Returns the number of active rule invocations.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Returns the number of memoized rule results.
    pub fn cache_entries(&self) -> usize {
        self.cache.len()
    }

    // DIAGNOSTICS
    // --------------------------------------------------------------------------------------------

    /// Builds a position-anchored diagnostic block with up to 60 characters
    /// of context on each side and the given caller chain (deepest last).
    fn report(
        &self,
        at: usize,
        message: String,
        rules: &[usize],
        internal: bool,
    ) -> FailureReport {
        let at = at.min(self.input.len());
        let before: String = self.input[at.saturating_sub(60)..at].iter().collect();
        let after_end = (at + 60).min(self.input.len());
        let after: String = self.input[at..after_end].iter().collect();
        let rules = rules
            .iter()
            .rev()
            .filter_map(|&index| self.program.label_name(index))
            .map(String::from)
            .collect();
        FailureReport { message, before, after, rules, internal }
    }

    /// Builds an internal report anchored at the current position with the
    /// live caller chain.
    fn internal_report(&self, message: String) -> FailureReport {
        let rules: Vec<usize> = self.call_stack.iter().filter_map(|frame| frame.rule).collect();
        self.report(self.pos, message, &rules, true)
    }
}
