//! Flattens a fragment tree into final text.
//!
//! The renderer walks the tree depth-first while tracking the current left
//! margin and whether it sits at the start of a line. Margin spaces are
//! written lazily, only when a non-empty string lands at a line start, so
//! margin changes between a line break and the next text take effect before
//! anything is printed. No trailing newline is added; the final line break
//! must come from an emitted `NL`.

use crate::{Fragment, Value};

// RENDERER
// ================================================================================================

/// Renders the machine's final return value to a string.
pub fn render(value: &Value) -> String {
    let mut renderer = Renderer::default();
    match value {
        Value::Str(text) => renderer.text(text),
        Value::Tree(fragments) => renderer.fragments(fragments),
    }
    renderer.out
}

#[derive(Default)]
struct Renderer {
    out: String,
    margin: i32,
    midline: bool,
}

impl Renderer {
    /// Walks a fragment list iteratively; grouping depth is bounded only by
    /// the program, so the walk keeps its own stack instead of recursing.
    fn fragments<'a>(&mut self, fragments: &'a [Fragment]) {
        let mut stack: Vec<core::slice::Iter<'a, Fragment>> = vec![fragments.iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                None => {
                    stack.pop();
                },
                Some(Fragment::List(inner)) => stack.push(inner.iter()),
                Some(Fragment::Indent(0)) => {
                    self.out.push('\n');
                    self.midline = false;
                },
                Some(Fragment::Indent(amount)) => {
                    self.margin = (self.margin + amount).max(0);
                },
                Some(Fragment::Str(text)) => self.text(text),
            }
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.midline {
            for _ in 0..self.margin {
                self.out.push(' ');
            }
            self.midline = true;
        }
        self.out.push_str(text);
    }
}

// TESTS
// ================================================================================================
