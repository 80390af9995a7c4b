use core::fmt;
use std::collections::BTreeMap;

use crate::{Instruction, errors::ProgramError};

// PROGRAM ITEM
// ================================================================================================

/// One entry of a program stream: a label marker or an instruction.
///
/// Labels are not instructions; they associate a name with the index of the
/// following instruction and are skipped by the machine's fetch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramItem {
    Label(Box<str>),
    Inst(Instruction),
}

impl From<Instruction> for ProgramItem {
    fn from(inst: Instruction) -> Self {
        Self::Inst(inst)
    }
}

// PROGRAM
// ================================================================================================

/// A validated parsing-machine program: the item stream plus the eagerly
/// resolved label table.
///
/// Construction checks the entry shape, rejects duplicate labels, and
/// resolves every branch and call target, so execution never encounters an
/// unknown label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    items: Vec<ProgramItem>,
    labels: BTreeMap<Box<str>, usize>,
}

impl Program {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Builds a program from an item stream, resolving the label table.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the stream is empty, or does not begin with an `ADR`/`CALL`
    ///   instruction;
    /// - a label is defined more than once;
    /// - any branch or call target is not defined anywhere in the stream.
    pub fn new(items: Vec<ProgramItem>) -> Result<Self, ProgramError> {
        match items.first() {
            None => return Err(ProgramError::Empty),
            Some(ProgramItem::Inst(inst)) if inst.is_entry() => (),
            Some(ProgramItem::Inst(inst)) => {
                return Err(ProgramError::InvalidEntry { found: inst.to_string() });
            },
            Some(ProgramItem::Label(label)) => {
                return Err(ProgramError::InvalidEntry { found: format!("label '{label}'") });
            },
        }

        let mut labels = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            if let ProgramItem::Label(name) = item {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(ProgramError::DuplicateLabel(name.clone()));
                }
            }
        }

        for item in &items {
            if let ProgramItem::Inst(inst) = item {
                if let Some(target) = inst.target() {
                    if !labels.contains_key(target) {
                        return Err(ProgramError::UndefinedLabel {
                            label: target.into(),
                            opcode: inst.mnemonic(),
                        });
                    }
                }
            }
        }

        Ok(Self { items, labels })
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the item stream.
    pub fn items(&self) -> &[ProgramItem] {
        &self.items
    }

    /// Returns the number of items (labels included).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the program holds no items. A constructed program is
    /// never empty; this exists for symmetry with [`Program::len`].
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item index of the given label, if the label is defined.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Returns the name of the label item at the given index.
    pub fn label_name(&self, index: usize) -> Option<&str> {
        match self.items.get(index) {
            Some(ProgramItem::Label(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns true if the program defines the given label.
    pub fn defines(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Returns the defined label names, in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(AsRef::as_ref)
    }
}

impl fmt::Display for Program {
    /// Formats the program in the wire format, one item per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            match item {
                ProgramItem::Label(name) => {
                    f.write_str("'")?;
                    crate::instruction::write_escaped(f, name)?;
                    f.write_str("',\n")?;
                },
                ProgramItem::Inst(inst) => writeln!(f, "{inst}")?,
            }
        }
        Ok(())
    }
}

// TESTS
// ================================================================================================
