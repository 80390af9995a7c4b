//! The built-in `*whitespace*` rule.
//!
//! The standard grammar idiom prefixes terminals with a call to
//! `*whitespace*`, so every program must define it. Programs compiled from
//! grammars that define their own (the metacompiler itself does, to allow
//! `#` comments in grammar source) are left alone; for the rest the canonical
//! definition is appended. Its labels start with `X` so they cannot collide
//! with the `L`-prefixed labels of generator output.

use metac_core::ProgramItem;

use crate::parser;

/// Name of the built-in whitespace rule.
pub const WHITESPACE_RULE: &str = "*whitespace*";

/// Name of the optional comment rule the fallback hooks into.
const COMMENT_RULE: &str = "comment";

/// Compiled form of
/// `<*whitespace*> ::= REPEAT ( ANY_OF ' \t\n\r\v\f' ) ;`.
const FALLBACK: &str = r"
'*whitespace*',
(CHECKPOINT,),
'X126',
(BRA,),
(CHECKPOINT,),
(ANY_OF, ' \t\n\r\v\f'),
(YIELD,),
(BF, 'X127'),
(COMMIT,),
(YIELD,),
(B, 'X128'),
'X127',
(ROLLBACK,),
'X128',
'X129',
(KET,),
(YIELD,),
(BT, 'X126'),
(SET,),
(BF, 'X124'),
(COMMIT,),
(YIELD,),
(B, 'X125'),
'X124',
(ROLLBACK,),
'X125',
'X130',
(R,),
";

/// Compiled form of
/// `<*whitespace*> ::= REPEAT ( ANY_OF ' \t\n\r\v\f' | <comment> ) ;`,
/// used when the program defines a `comment` rule of its own.
const FALLBACK_WITH_COMMENT: &str = r"
'*whitespace*',
(CHECKPOINT,),
'X126',
(BRA,),
(CHECKPOINT,),
(ANY_OF, ' \t\n\r\v\f'),
(YIELD,),
(BF, 'X131'),
(COMMIT,),
(YIELD,),
(B, 'X132'),
'X131',
(ROLLBACK,),
'X132',
(BT, 'X133'),
(CHECKPOINT,),
(CALL, 'comment'),
(YIELD,),
(BF, 'X134'),
(COMMIT,),
(YIELD,),
(B, 'X135'),
'X134',
(ROLLBACK,),
'X135',
'X133',
(KET,),
(YIELD,),
(BT, 'X126'),
(SET,),
(BF, 'X124'),
(COMMIT,),
(YIELD,),
(B, 'X125'),
'X124',
(ROLLBACK,),
'X125',
'X130',
(R,),
";

/// Appends the canonical `*whitespace*` definition to an item stream that
/// does not define one. With a `comment` rule present, whitespace also
/// absorbs comments; otherwise it is pure ASCII whitespace.
pub fn ensure_whitespace(items: &mut Vec<ProgramItem>) {
    let defines = |name: &str| {
        items.iter().any(|item| matches!(item, ProgramItem::Label(label) if &**label == name))
    };
    if defines(WHITESPACE_RULE) {
        return;
    }
    let code = if defines(COMMENT_RULE) { FALLBACK_WITH_COMMENT } else { FALLBACK };
    items.extend(parser::parse_items(code).expect("embedded whitespace code is well formed"));
}

// TESTS
// ================================================================================================
