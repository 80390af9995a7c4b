//! Cursor-based parser for the wire format.
//!
//! The grammar is line-shaped but whitespace-insensitive: items may be
//! separated by any whitespace, and `#` starts a comment running to the end
//! of the line. Comments never occur in emitted text; they are accepted so
//! hand-written program fixtures can be annotated.

use metac_core::{Instruction, ProgramItem};

use crate::{
    errors::{ParseError, ParseErrorKind},
    escape,
};

// ENTRY POINT
// ================================================================================================

/// Parses wire-format text into a raw item stream.
///
/// The stream is not validated here; building a
/// [`Program`](metac_core::Program) from it performs entry and label checks.
///
/// # Errors
/// Returns an error describing the first malformed item, with its 1-based
/// line and column.
pub fn parse_items(text: &str) -> Result<Vec<ProgramItem>, ParseError> {
    let mut parser = Parser::new(text);
    let mut items = Vec::new();
    loop {
        parser.skip_trivia();
        match parser.peek() {
            None => break,
            Some('\'') => {
                let name = parser.quoted_string()?;
                parser.skip_trivia();
                parser.eat(',');
                items.push(ProgramItem::Label(name.into()));
            },
            Some('(') => items.push(ProgramItem::Inst(parser.instruction()?)),
            Some(found) => {
                return Err(parser.error(ParseErrorKind::UnexpectedChar(found)));
            },
        }
    }
    Ok(items)
}

// PARSER
// ================================================================================================

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self { chars: text.chars().collect(), pos: 0 }
    }

    // ITEM PARSERS
    // --------------------------------------------------------------------------------------------

    /// Parses `(MNEMONIC,),` or `(MNEMONIC, 'operand'),`; the inner and
    /// trailing commas are optional.
    fn instruction(&mut self) -> Result<Instruction, ParseError> {
        self.expect('(', "'('")?;
        self.skip_trivia();

        let mnemonic_at = self.pos;
        let mut mnemonic = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_uppercase() || ch == '_' {
                mnemonic.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        if mnemonic.is_empty() {
            return Err(match self.peek() {
                Some(found) => {
                    self.error(ParseErrorKind::Expected { expected: "an opcode mnemonic", found })
                },
                None => self.error(ParseErrorKind::UnexpectedEof { expected: "an opcode mnemonic" }),
            });
        }

        self.skip_trivia();
        let mut operand = None;
        if self.eat(',') {
            self.skip_trivia();
            if self.peek() == Some('\'') {
                operand = Some(self.quoted_string()?);
                self.skip_trivia();
            }
        }
        self.expect(')', "')'")?;
        self.skip_trivia();
        self.eat(',');

        Instruction::from_parts(&mnemonic, operand)
            .map_err(|err| self.error_at(mnemonic_at, ParseErrorKind::BadInstruction(err)))
    }

    /// Parses a single-quoted string, applying the wire-format escapes.
    fn quoted_string(&mut self) -> Result<String, ParseError> {
        let quote_at = self.pos;
        self.expect('\'', "'''")?;
        let mut raw = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(quote_at, ParseErrorKind::UnterminatedString)),
                Some('\'') => break,
                Some('\\') => {
                    raw.push('\\');
                    match self.bump() {
                        None => {
                            return Err(
                                self.error_at(quote_at, ParseErrorKind::UnterminatedString)
                            );
                        },
                        Some(ch) => raw.push(ch),
                    }
                },
                Some(ch) => raw.push(ch),
            }
        }
        escape::unescape(&raw).map_err(|kind| self.error_at(quote_at, kind))
    }

    // CURSOR PRIMITIVES
    // --------------------------------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char, label: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.pos += 1;
                Ok(())
            },
            Some(found) => Err(self.error(ParseErrorKind::Expected { expected: label, found })),
            None => Err(self.error(ParseErrorKind::UnexpectedEof { expected: label })),
        }
    }

    /// Skips whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.pos += 1;
                },
                Some('#') => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                },
                _ => break,
            }
        }
    }

    // ERROR CONSTRUCTION
    // --------------------------------------------------------------------------------------------

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, at: usize, kind: ParseErrorKind) -> ParseError {
        let mut line = 1;
        let mut column = 1;
        for &ch in &self.chars[..at.min(self.chars.len())] {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        ParseError { line, column, kind }
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use metac_core::{Instruction, Program, ProgramItem};
    use pretty_assertions::assert_eq;

    use super::parse_items;
    use crate::errors::ParseErrorKind;

    #[test]
    fn parses_labels_and_instructions() {
        let items = parse_items(
            "(ADR, 'top'),\n'top',\n(CHECKPOINT,),\n(LITERAL, 'ab'),\n(BF, 'L1'),\n\
             (COMMIT,),\n(B, 'L2'),\n'L1',\n(ROLLBACK,),\n'L2',\n(R,),\n(END,),\n",
        )
        .unwrap();

        assert_eq!(items.len(), 12);
        assert_eq!(items[0], ProgramItem::Inst(Instruction::Adr("top".into())));
        assert_eq!(items[1], ProgramItem::Label("top".into()));
        assert_eq!(items[3], ProgramItem::Inst(Instruction::Literal("ab".into())));
        assert_eq!(items[11], ProgramItem::Inst(Instruction::End));
    }

    #[test]
    fn accepts_comments_and_loose_whitespace() {
        let items = parse_items(
            "# entry\n  (ADR, 'top'),   # call the entry rule\n'top', (SET,), (R,)",
        )
        .unwrap();
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn operands_may_contain_structural_characters() {
        let items = parse_items("(CL, '(BT, '),").unwrap();
        assert_eq!(items[0], ProgramItem::Inst(Instruction::Cl("(BT, ".into())));

        let items = parse_items("(CL, 'a, # not a comment)'),").unwrap();
        assert_eq!(items[0], ProgramItem::Inst(Instruction::Cl("a, # not a comment)".into())));
    }

    #[test]
    fn escapes_collapse_at_load_time() {
        let items = parse_items(r"(ANY_OF, ' \t\n\r\u000b\u000c'),").unwrap();
        assert_eq!(items[0], ProgramItem::Inst(Instruction::AnyOf(" \t\n\r\u{b}\u{c}".into())));

        let items = parse_items(r"(CL, '\''),").unwrap();
        assert_eq!(items[0], ProgramItem::Inst(Instruction::Cl("'".into())));
    }

    #[test]
    fn operand_strings_may_span_lines() {
        let items = parse_items("(LITERAL, 'a\nb'),").unwrap();
        assert_eq!(items[0], ProgramItem::Inst(Instruction::Literal("a\nb".into())));
    }

    #[test]
    fn display_round_trips_through_the_parser() {
        let text = "(ADR, 'top'),\n'top',\n(ANY_OF, ' \\t\\n'),\n(CL, '\\''),\n(STORE, 'x'),\n\
                    (LOAD, 'x'),\n(YIELD,),\n(R,),\n";
        let program = Program::new(parse_items(text).unwrap()).unwrap();
        let reparsed = Program::new(parse_items(&program.to_string()).unwrap()).unwrap();
        assert_eq!(program, reparsed);
    }

    #[test]
    fn unterminated_string_is_reported_at_its_quote() {
        let err = parse_items("(CALL, 'oops),\n(R,),").unwrap_err();
        assert_eq!((err.line, err.column), (1, 8));
        assert!(matches!(err.kind, ParseErrorKind::UnterminatedString));
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let err = parse_items("(FROB,),").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::BadInstruction(_)));
    }

    #[test]
    fn stray_characters_are_rejected() {
        let err = parse_items("42").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedChar('4')));
    }
}
