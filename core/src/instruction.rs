use core::fmt;

use crate::errors::ProgramError;

// INSTRUCTION
// ================================================================================================

/// A single parsing-machine instruction.
///
/// Operands are either absent, a label name (control flow), a character set or
/// text to match (primitive matchers), a text to emit (`CL`), or a local
/// variable name (`STORE`/`LOAD`). Variant names follow the instruction
/// mnemonics used by the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // ---- control flow --------------------------------------------------------------------------
    /// Program entry: identical to `CALL`, but with a nil return PC, so the
    /// entry rule's `R` halts the machine.
    Adr(Box<str>),
    /// Invokes a rule, consulting the packrat cache first.
    Call(Box<str>),
    /// Returns from a rule, consolidating its output into the return value
    /// and recording the result in the packrat cache.
    R,
    /// Unconditional branch.
    B(Box<str>),
    /// Branch if the success flag is set.
    Bt(Box<str>),
    /// Branch if the success flag is clear.
    Bf(Box<str>),
    /// Halts the machine. Emitted as the terminator of generated programs.
    End,

    // ---- backtracking scopes -------------------------------------------------------------------
    /// Opens a backtracking scope: saves position and output list.
    Checkpoint,
    /// Closes a scope keeping the input advance; consolidates output into the
    /// return value and sets the success flag.
    Commit,
    /// Closes a scope discarding the input advance; clears the return value
    /// and the success flag.
    Rollback,
    /// Opens an output-only group: saves the output list, not the position.
    Bra,
    /// Closes an output-only group; position and success flag are untouched.
    Ket,

    // ---- primitive matchers --------------------------------------------------------------------
    /// Matches one character drawn from the operand set.
    AnyOf(Box<str>),
    /// Matches one character *not* drawn from the operand set.
    AnyBut(Box<str>),
    /// Matches the operand text exactly, character by character.
    Literal(Box<str>),

    // ---- output and value construction ---------------------------------------------------------
    /// Appends a text literal to the output list.
    Cl(Box<str>),
    /// Appends the current return value to the output list.
    Ci,
    /// Appends the current return value to the output list. Synonym of `CI`;
    /// this is the spelling the grammar compiler emits.
    Yield,
    /// Sets the return value to the empty string and succeeds trivially.
    Set,
    /// Sets the return value to the next decimal from the label counter.
    Gen,
    /// Binds the return value to a rule-local variable.
    Store(Box<str>),
    /// Loads a rule-local variable into the return value.
    Load(Box<str>),

    // ---- indentation directives ----------------------------------------------------------------
    /// Appends four literal spaces to the output list.
    Tb,
    /// Appends a margin-increase marker for the renderer.
    Lmi,
    /// Appends a margin-decrease marker for the renderer.
    Lmd,
    /// Appends a line-break marker for the renderer.
    Nl,
}

impl Instruction {
    /// Returns the wire-format mnemonic of this instruction.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Adr(_) => "ADR",
            Self::Call(_) => "CALL",
            Self::R => "R",
            Self::B(_) => "B",
            Self::Bt(_) => "BT",
            Self::Bf(_) => "BF",
            Self::End => "END",
            Self::Checkpoint => "CHECKPOINT",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
            Self::Bra => "BRA",
            Self::Ket => "KET",
            Self::AnyOf(_) => "ANY_OF",
            Self::AnyBut(_) => "ANY_BUT",
            Self::Literal(_) => "LITERAL",
            Self::Cl(_) => "CL",
            Self::Ci => "CI",
            Self::Yield => "YIELD",
            Self::Set => "SET",
            Self::Gen => "GEN",
            Self::Store(_) => "STORE",
            Self::Load(_) => "LOAD",
            Self::Tb => "TB",
            Self::Lmi => "LMI",
            Self::Lmd => "LMD",
            Self::Nl => "NL",
        }
    }

    /// Returns the label this instruction branches to or calls, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Adr(label) | Self::Call(label) | Self::B(label) | Self::Bt(label)
            | Self::Bf(label) => Some(label),
            _ => None,
        }
    }

    /// Returns true for the instructions allowed in the entry slot of a
    /// program.
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::Adr(_) | Self::Call(_))
    }

    /// Builds an instruction from a wire-format mnemonic and optional operand.
    ///
    /// # Errors
    /// Returns an error if the mnemonic is unknown, or if the operand is
    /// missing or superfluous for the given mnemonic.
    pub fn from_parts(mnemonic: &str, operand: Option<String>) -> Result<Self, ProgramError> {
        let with = |ctor: fn(Box<str>) -> Self, operand: Option<String>| {
            operand
                .map(|arg| ctor(arg.into()))
                .ok_or_else(|| ProgramError::MissingOperand { opcode: mnemonic.into() })
        };
        let without = |inst: Self, operand: Option<String>| {
            if operand.is_some() {
                Err(ProgramError::UnexpectedOperand { opcode: mnemonic.into() })
            } else {
                Ok(inst)
            }
        };
        match mnemonic {
            "ADR" => with(Self::Adr, operand),
            "CALL" => with(Self::Call, operand),
            "R" => without(Self::R, operand),
            "B" => with(Self::B, operand),
            "BT" => with(Self::Bt, operand),
            "BF" => with(Self::Bf, operand),
            "END" => without(Self::End, operand),
            "CHECKPOINT" => without(Self::Checkpoint, operand),
            "COMMIT" => without(Self::Commit, operand),
            "ROLLBACK" => without(Self::Rollback, operand),
            "BRA" => without(Self::Bra, operand),
            "KET" => without(Self::Ket, operand),
            "ANY_OF" => with(Self::AnyOf, operand),
            "ANY_BUT" => with(Self::AnyBut, operand),
            "LITERAL" => with(Self::Literal, operand),
            "CL" => with(Self::Cl, operand),
            "CI" => without(Self::Ci, operand),
            "YIELD" => without(Self::Yield, operand),
            "SET" => without(Self::Set, operand),
            "GEN" => without(Self::Gen, operand),
            "STORE" => with(Self::Store, operand),
            "LOAD" => with(Self::Load, operand),
            "TB" => without(Self::Tb, operand),
            "LMI" => without(Self::Lmi, operand),
            "LMD" => without(Self::Lmd, operand),
            "NL" => without(Self::Nl, operand),
            other => Err(ProgramError::UnknownOpcode { opcode: other.into() }),
        }
    }

    fn operand(&self) -> Option<&str> {
        match self {
            Self::Adr(arg) | Self::Call(arg) | Self::B(arg) | Self::Bt(arg) | Self::Bf(arg)
            | Self::AnyOf(arg) | Self::AnyBut(arg) | Self::Literal(arg) | Self::Cl(arg)
            | Self::Store(arg) | Self::Load(arg) => Some(arg),
            _ => None,
        }
    }
}

// WIRE-FORMAT DISPLAY
// ================================================================================================

impl fmt::Display for Instruction {
    /// Formats the instruction in the wire format, e.g. `(CALL, 'st'),` or
    /// `(COMMIT,),`. Operands are escaped so that the output parses back to
    /// an equal instruction.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(arg) => {
                write!(f, "({}, '", self.mnemonic())?;
                write_escaped(f, arg)?;
                write!(f, "'),")
            },
            None => write!(f, "({},),", self.mnemonic()),
        }
    }
}

/// Writes `text` with the wire-format escapes applied: backslash, quotes, the
/// named control characters, and `\uXXXX` for any other control character.
pub(crate) fn write_escaped(f: &mut impl fmt::Write, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '"' => f.write_str("\\\"")?,
            '\u{0007}' => f.write_str("\\a")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\u{000c}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{000b}' => f.write_str("\\v")?,
            '\0' => f.write_str("\\0")?,
            ch if ch.is_control() => write!(f, "\\u{:04x}", ch as u32)?,
            ch => f.write_char(ch)?,
        }
    }
    Ok(())
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::Instruction;

    #[rstest]
    #[case(Instruction::R, "(R,),")]
    #[case(Instruction::Commit, "(COMMIT,),")]
    #[case(Instruction::Call("st".into()), "(CALL, 'st'),")]
    #[case(Instruction::Cl("(BT, ".into()), "(CL, '(BT, '),")]
    #[case(Instruction::AnyOf(" \t\n".into()), "(ANY_OF, ' \\t\\n'),")]
    #[case(Instruction::Literal("'".into()), "(LITERAL, '\\''),")]
    fn wire_display(#[case] inst: Instruction, #[case] expected: &str) {
        assert_eq!(inst.to_string(), expected);
    }

    #[test]
    fn from_parts_validates_operands() {
        assert_eq!(
            Instruction::from_parts("CALL", Some("id".into())).unwrap(),
            Instruction::Call("id".into()),
        );
        assert!(Instruction::from_parts("CALL", None).is_err());
        assert!(Instruction::from_parts("COMMIT", Some("x".into())).is_err());
        assert!(Instruction::from_parts("FROB", None).is_err());
    }

    #[test]
    fn ci_and_yield_are_distinct_spellings() {
        assert_eq!(Instruction::from_parts("CI", None).unwrap().mnemonic(), "CI");
        assert_eq!(Instruction::from_parts("YIELD", None).unwrap().mnemonic(), "YIELD");
    }
}
