//! Function discovery in Python source.
//!
//! Source is parsed into a syntax tree; every `def` and `async def` node,
//! nested or not, is a function. Its body is the union of the line ranges
//! of its body statements, so a one-line function (`def f(): return 1`)
//! has the header line as its body. A function counts as covered when any
//! body line was executed. A file that does not parse has no functions.

use crate::error::{Result, RunnerError};
use std::collections::BTreeSet;
use tree_sitter::{Node, Parser};

const FUNCTION_NODE: &str = "function_definition";

/// A discovered function and its body lines (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub def_line: u32,
    pub body: BTreeSet<u32>,
}

/// Function totals for one source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionCoverage {
    pub total: usize,
    pub covered: usize,
}

pub struct FunctionScanner {
    parser: Parser,
}

impl std::fmt::Debug for FunctionScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionScanner").finish_non_exhaustive()
    }
}

impl FunctionScanner {
    /// # Errors
    ///
    /// Returns `Coverage` if the Python grammar cannot be loaded.
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|err| RunnerError::Coverage(format!("python grammar: {err}")))?;
        Ok(Self { parser })
    }

    /// Functions in source order. `None` when the source has syntax errors.
    pub fn scan(&mut self, source: &str) -> Option<Vec<FunctionSpan>> {
        let tree = self.parser.parse(source, None)?;
        let root = tree.root_node();
        if root.has_error() {
            return None;
        }
        let mut spans = Vec::new();
        collect_functions(root, source.as_bytes(), &mut spans);
        Some(spans)
    }

    pub fn coverage(&mut self, source: &str, executed: &BTreeSet<u32>) -> FunctionCoverage {
        let Some(spans) = self.scan(source) else {
            return FunctionCoverage::default();
        };
        let covered = spans
            .iter()
            .filter(|span| !span.body.is_disjoint(executed))
            .count();
        FunctionCoverage {
            total: spans.len(),
            covered,
        }
    }
}

fn line_number(row: usize) -> u32 {
    u32::try_from(row + 1).unwrap_or(u32::MAX)
}

fn collect_functions(node: Node<'_>, source: &[u8], spans: &mut Vec<FunctionSpan>) {
    if node.kind() == FUNCTION_NODE {
        let name = node
            .child_by_field_name("name")
            .and_then(|name| name.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string();
        spans.push(FunctionSpan {
            name,
            def_line: line_number(node.start_position().row),
            body: body_lines(node),
        });
    }
    for child in node.named_children(&mut node.walk()) {
        collect_functions(child, source, spans);
    }
}

fn body_lines(function: Node<'_>) -> BTreeSet<u32> {
    let mut lines = BTreeSet::new();
    let Some(block) = function.child_by_field_name("body") else {
        return lines;
    };
    for stmt in block.named_children(&mut block.walk()) {
        if stmt.is_extra() {
            continue;
        }
        let start = stmt.start_position().row;
        let end = stmt.end_position();
        // A node ending at column 0 stops before that row.
        let last = if end.column == 0 && end.row > start {
            end.row - 1
        } else {
            end.row
        };
        lines.extend((start..=last).map(line_number));
    }
    lines
}
