// OUTPUT FRAGMENT
// ================================================================================================

/// One piece of accumulated output.
///
/// Rule bodies collect fragments into an output list; when a scope closes the
/// list is consolidated into a [`Value`]. Integer markers steer the renderer:
/// `Indent(0)` is a line break, positive and negative amounts adjust the left
/// margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Str(String),
    Indent(i32),
    List(Vec<Fragment>),
}

impl Fragment {
    /// The margin adjustment applied by `LMI` and `LMD`.
    pub const MARGIN_STEP: i32 = 4;

    /// The line-break marker emitted by `NL`.
    pub const NEWLINE: Fragment = Fragment::Indent(0);
}

impl From<char> for Fragment {
    fn from(ch: char) -> Self {
        Self::Str(ch.to_string())
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::Str(text.to_string())
    }
}

// VALUE
// ================================================================================================

/// The machine's return-value scalar: a plain string in the common case, or a
/// fragment tree when markers or nested groups are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Tree(Vec<Fragment>),
}

impl Value {
    /// Returns the empty-string value, the state `RETVAL` starts in.
    pub fn empty() -> Self {
        Self::Str(String::new())
    }

    /// Consolidates an output list into a value: a list made purely of
    /// strings collapses to their concatenation, anything else is kept as a
    /// tree so markers survive to the renderer.
    pub fn consolidate(fragments: Vec<Fragment>) -> Self {
        let all_strings = fragments.iter().all(|f| matches!(f, Fragment::Str(_)));
        if all_strings {
            let mut text = String::new();
            for fragment in &fragments {
                if let Fragment::Str(s) = fragment {
                    text.push_str(s);
                }
            }
            Self::Str(text)
        } else {
            Self::Tree(fragments)
        }
    }

    /// Converts this value into a fragment, for appending to an output list.
    pub fn into_fragment(self) -> Fragment {
        match self {
            Self::Str(text) => Fragment::Str(text),
            Self::Tree(fragments) => Fragment::List(fragments),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.to_string())
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Fragment, Value};

    #[test]
    fn all_string_lists_collapse() {
        let value = Value::consolidate(vec!["ab".into(), "".into(), "c".into()]);
        assert_eq!(value, Value::Str("abc".to_string()));
    }

    #[test]
    fn empty_list_collapses_to_empty_string() {
        assert_eq!(Value::consolidate(vec![]), Value::empty());
    }

    #[test]
    fn marker_keeps_the_tree() {
        let fragments = vec!["a".into(), Fragment::NEWLINE, "b".into()];
        let value = Value::consolidate(fragments.clone());
        assert_eq!(value, Value::Tree(fragments));
    }

    #[test]
    fn nested_list_keeps_the_tree() {
        let fragments = vec![Fragment::List(vec!["a".into()])];
        assert_eq!(Value::consolidate(fragments.clone()), Value::Tree(fragments));
    }
}
