//! Opcode implementations.
//!
//! Each function mutates the machine registers and stacks exactly as the
//! instruction prescribes; primitive match failure is ordinary control flow
//! on the success flag, never an error. Errors out of these functions mean
//! the compiled program itself is broken.

use core::mem;

use metac_core::{Fragment, Instruction, Value};

use super::{CallFrame, ExprFrame, Machine};
use crate::{cache::CacheEntry, errors::ExecutionError};

impl<'p> Machine<'p> {
    // DISPATCH
    // --------------------------------------------------------------------------------------------

    pub(super) fn execute(&mut self, inst: &'p Instruction) -> Result<(), ExecutionError> {
        match inst {
            // control flow
            Instruction::Adr(label) | Instruction::Call(label) => self.op_call(label),
            Instruction::R => self.op_ret(),
            Instruction::B(label) => self.op_branch(label, true),
            Instruction::Bt(label) => self.op_branch(label, self.switch),
            Instruction::Bf(label) => self.op_branch(label, !self.switch),
            Instruction::End => {
                self.pc = None;
                Ok(())
            },

            // backtracking scopes
            Instruction::Checkpoint => self.op_checkpoint(),
            Instruction::Commit => self.op_commit(),
            Instruction::Rollback => self.op_rollback(),
            Instruction::Bra => self.op_bra(),
            Instruction::Ket => self.op_ket(),

            // primitive matchers
            Instruction::AnyOf(set) => self.match_one(|ch| set.contains(ch)),
            Instruction::AnyBut(set) => self.match_one(|ch| !set.contains(ch)),
            Instruction::Literal(text) => self.op_literal(text),

            // output and value construction
            Instruction::Cl(text) => {
                self.output.push(Fragment::Str(text.to_string()));
                Ok(())
            },
            Instruction::Ci | Instruction::Yield => {
                self.output.push(self.retval.clone().into_fragment());
                Ok(())
            },
            Instruction::Set => {
                self.retval = Value::empty();
                self.succeed();
                Ok(())
            },
            Instruction::Gen => {
                self.retval = Value::Str(self.gen_counter.to_string());
                self.gen_counter += 1;
                self.succeed();
                Ok(())
            },
            Instruction::Store(name) => {
                self.locals.insert(name.clone(), self.retval.clone());
                Ok(())
            },
            Instruction::Load(name) => self.op_load(name),

            // indentation directives
            Instruction::Tb => {
                self.output.push(Fragment::Str("    ".to_string()));
                Ok(())
            },
            Instruction::Lmi => {
                self.output.push(Fragment::Indent(Fragment::MARGIN_STEP));
                Ok(())
            },
            Instruction::Lmd => {
                self.output.push(Fragment::Indent(-Fragment::MARGIN_STEP));
                Ok(())
            },
            Instruction::Nl => {
                self.output.push(Fragment::NEWLINE);
                Ok(())
            },
        }
    }

    // RULE INVOCATION
    // --------------------------------------------------------------------------------------------

    /// `CALL`/`ADR`: invoke a rule, consulting the packrat cache first.
    ///
    /// The backtracking frame pushed here saves the caller's position and
    /// output list. `R` keeps the callee's input advance, so a rule that
    /// needs to undo its own consumption on failure must do so with explicit
    /// `CHECKPOINT` pairs in its body — the call envelope will not.
    fn op_call(&mut self, label: &'p str) -> Result<(), ExecutionError> {
        let target = self.lookup(label)?;

        if self.options.packrat() {
            if let Some(entry) = self.cache.get((self.pos, target)) {
                let entry = entry.clone();
                self.pos = entry.exit_pos;
                self.retval = entry.retval;
                self.switch = entry.switch;
                self.stats.cache_hits += 1;
                return Ok(());
            }
        }

        if self.call_stack.len() >= self.options.max_call_depth() {
            return Err(ExecutionError::CallDepthExceeded(self.options.max_call_depth()));
        }
        self.call_stack.push(CallFrame {
            return_pc: self.pc,
            rule: mem::replace(&mut self.rule, Some(target)),
            locals: mem::take(&mut self.locals),
        });
        let output = mem::take(&mut self.output);
        self.push_expr(ExprFrame::Backtrack { pos: self.pos, output })?;
        self.pc = Some(target);
        self.stats.rule_calls += 1;
        Ok(())
    }

    /// `R`: return from a rule, memoizing the result under the rule's entry
    /// position — success or failure alike.
    fn op_ret(&mut self) -> Result<(), ExecutionError> {
        self.consolidate();
        let (entry_pos, output) = match self.pop_expr("R")? {
            ExprFrame::Backtrack { pos, output } => (pos, output),
            frame @ ExprFrame::Group { .. } => {
                return Err(ExecutionError::ScopeMismatch {
                    opcode: "R",
                    expected: "backtracking",
                    found: frame.kind(),
                });
            },
        };
        self.output = output;

        if self.options.packrat() {
            if let Some(rule) = self.rule {
                self.cache.record(
                    (entry_pos, rule),
                    CacheEntry {
                        exit_pos: self.pos,
                        retval: self.retval.clone(),
                        switch: self.switch,
                    },
                );
            }
        }

        let frame = self.call_stack.pop().ok_or(ExecutionError::ReturnUnderflow)?;
        self.pc = frame.return_pc;
        self.rule = frame.rule;
        self.locals = frame.locals;
        Ok(())
    }

    fn op_branch(&mut self, label: &'p str, taken: bool) -> Result<(), ExecutionError> {
        if taken {
            self.pc = Some(self.lookup(label)?);
        }
        Ok(())
    }

    // BACKTRACKING SCOPES
    // --------------------------------------------------------------------------------------------

    /// `CHECKPOINT`: open a scope saving position and output list.
    fn op_checkpoint(&mut self) -> Result<(), ExecutionError> {
        let output = mem::take(&mut self.output);
        self.push_expr(ExprFrame::Backtrack { pos: self.pos, output })
    }

    /// `COMMIT`: close a scope keeping the input advance.
    fn op_commit(&mut self) -> Result<(), ExecutionError> {
        self.consolidate();
        match self.pop_expr("COMMIT")? {
            ExprFrame::Backtrack { output, .. } => {
                self.output = output;
                self.succeed();
                Ok(())
            },
            frame @ ExprFrame::Group { .. } => Err(ExecutionError::ScopeMismatch {
                opcode: "COMMIT",
                expected: "backtracking",
                found: frame.kind(),
            }),
        }
    }

    /// `ROLLBACK`: close a scope restoring position and output list; the
    /// return value is cleared and the success flag lowered.
    fn op_rollback(&mut self) -> Result<(), ExecutionError> {
        match self.pop_expr("ROLLBACK")? {
            ExprFrame::Backtrack { pos, output } => {
                self.pos = pos;
                self.output = output;
                self.retval = Value::empty();
                self.switch = false;
                Ok(())
            },
            frame @ ExprFrame::Group { .. } => Err(ExecutionError::ScopeMismatch {
                opcode: "ROLLBACK",
                expected: "backtracking",
                found: frame.kind(),
            }),
        }
    }

    /// `BRA`: open an output-only group.
    fn op_bra(&mut self) -> Result<(), ExecutionError> {
        let output = mem::take(&mut self.output);
        self.push_expr(ExprFrame::Group { output })
    }

    /// `KET`: close an output-only group; position and success flag are left
    /// untouched.
    fn op_ket(&mut self) -> Result<(), ExecutionError> {
        self.consolidate();
        match self.pop_expr("KET")? {
            ExprFrame::Group { output } => {
                self.output = output;
                Ok(())
            },
            frame @ ExprFrame::Backtrack { .. } => Err(ExecutionError::ScopeMismatch {
                opcode: "KET",
                expected: "group",
                found: frame.kind(),
            }),
        }
    }

    // PRIMITIVE MATCHERS
    // --------------------------------------------------------------------------------------------

    /// Matches a single character under a private checkpoint/commit/rollback
    /// envelope. At end of input the match fails.
    fn match_one(&mut self, accept: impl Fn(char) -> bool) -> Result<(), ExecutionError> {
        self.op_checkpoint()?;
        match self.input.get(self.pos).copied() {
            Some(ch) if accept(ch) => {
                self.pos += 1;
                self.output.push(Fragment::from(ch));
                self.op_commit()
            },
            _ => self.op_rollback(),
        }
    }

    /// `LITERAL`: matches the text character by character under an outer
    /// envelope. Each matched character passes through its own single-char
    /// envelope, so the high-water mark advances even when a later character
    /// of the literal fails and the whole match rolls back.
    fn op_literal(&mut self, text: &'p str) -> Result<(), ExecutionError> {
        self.op_checkpoint()?;
        for expected in text.chars() {
            self.match_one(|ch| ch == expected)?;
            if self.switch {
                self.output.push(self.retval.clone().into_fragment());
            } else {
                return self.op_rollback();
            }
        }
        self.op_commit()
    }

    // VALUES AND LOCALS
    // --------------------------------------------------------------------------------------------

    /// `LOAD`: read a rule-local variable into the return value.
    fn op_load(&mut self, name: &'p str) -> Result<(), ExecutionError> {
        match self.locals.get(name) {
            Some(value) => {
                self.retval = value.clone();
                Ok(())
            },
            None => Err(ExecutionError::UnboundVariable(
                self.internal_report(format!("INTERNAL ERROR: No such variable: {name}")),
            )),
        }
    }

    // SHARED HELPERS
    // --------------------------------------------------------------------------------------------

    /// Folds the current output list into the return value: all-string lists
    /// collapse to one string, anything else stays a tree.
    fn consolidate(&mut self) {
        self.retval = Value::consolidate(mem::take(&mut self.output));
    }

    /// Raises the success flag; if the position moved past the high-water
    /// mark, snapshots the caller chain for error reporting.
    fn succeed(&mut self) {
        self.switch = true;
        if self.pos > self.hwm.pos {
            self.hwm.pos = self.pos;
            self.hwm.rules = self.call_stack.iter().filter_map(|frame| frame.rule).collect();
        }
    }

    fn lookup(&self, label: &str) -> Result<usize, ExecutionError> {
        // program validation resolves every target, so this cannot fail for
        // programs built through Program::new
        self.program
            .label_index(label)
            .ok_or_else(|| ExecutionError::UndefinedLabel(label.into()))
    }

    fn push_expr(&mut self, frame: ExprFrame) -> Result<(), ExecutionError> {
        if self.expr_stack.len() >= self.options.max_expr_depth() {
            return Err(ExecutionError::ExprDepthExceeded(self.options.max_expr_depth()));
        }
        self.expr_stack.push(frame);
        Ok(())
    }

    fn pop_expr(&mut self, opcode: &'static str) -> Result<ExprFrame, ExecutionError> {
        self.expr_stack.pop().ok_or(ExecutionError::ScopeUnderflow { opcode })
    }
}
