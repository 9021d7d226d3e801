//! Complexity and maintainability measurement.
//!
//! [`NativeMetrics`] computes, straight from the syntax tree, the same family
//! of numbers radon reports: per-function cyclomatic complexity, Halstead
//! volume, logical lines and the maintainability index built from them.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::analysis::python::{self, ParsedModule, SyntaxError};

/// Node kinds that each add one independent path.
const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "conditional_expression",
    "for_statement",
    "while_statement",
    "except_clause",
    "except_group_clause",
    "with_statement",
    "assert_statement",
    "for_in_clause",
    "if_clause",
    "boolean_operator",
    "case_clause",
];

/// Kinds that open a new scope measured on its own.
const SCOPE_KINDS: &[&str] = &["function_definition", "class_definition"];

/// Clause headers that count as a logical line.
const CLAUSE_KINDS: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub name: String,
    pub line: usize,
    pub complexity: u32,
}

/// Raw output of a metrics tool for one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub function_complexities: Vec<FunctionComplexity>,
    /// `None` when the tool could not compute it; treated as 0 downstream.
    pub maintainability_index: Option<f64>,
    pub halstead_volume: f64,
    pub logical_loc: usize,
    pub comment_lines: usize,
    pub source_lines: usize,
}

impl CodeMetrics {
    /// Mean function complexity, 0 when there are no functions.
    pub fn average_complexity(&self) -> f64 {
        if self.function_complexities.is_empty() {
            return 0.0;
        }
        let total: u32 = self.function_complexities.iter().map(|f| f.complexity).sum();
        total as f64 / self.function_complexities.len() as f64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("cannot measure unparsable source: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("metrics tool failed: {0}")]
    Tool(String),
}

/// Complexity/maintainability calculator.
pub trait MetricsTool: Send + Sync {
    fn measure(&self, source: &str) -> Result<CodeMetrics, MetricsError>;
}

/// In-process implementation over the tree-sitter parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMetrics;

impl MetricsTool for NativeMetrics {
    fn measure(&self, source: &str) -> Result<CodeMetrics, MetricsError> {
        let module = python::parse(source)?;

        // Coroutines carry complexity too
        let function_complexities: Vec<_> = module
            .nodes_of_kind("function_definition")
            .into_iter()
            .map(|function| FunctionComplexity {
                name: module.name(function).to_string(),
                line: function.start_position().row + 1,
                complexity: cyclomatic_complexity(function),
            })
            .collect();

        let halstead_volume = halstead_volume(&module);
        let logical_loc = logical_lines(&module);
        let lines = LineCounts::of(&module);
        let total_complexity: u32 = function_complexities.iter().map(|f| f.complexity).sum();

        let comment_percent = if lines.source == 0 {
            0.0
        } else {
            (lines.comments + lines.multiline_strings) as f64 / lines.source as f64 * 100.0
        };

        Ok(CodeMetrics {
            maintainability_index: Some(maintainability_index(
                halstead_volume,
                total_complexity as f64,
                logical_loc as f64,
                comment_percent,
            )),
            function_complexities,
            halstead_volume,
            logical_loc,
            comment_lines: lines.comments,
            source_lines: lines.source,
        })
    }
}

/// Cyclomatic complexity of one function: 1 plus its decision points,
/// excluding nested functions and classes.
pub fn cyclomatic_complexity(function: Node<'_>) -> u32 {
    let Some(body) = function.child_by_field_name("body") else {
        return 1;
    };

    let mut complexity = 1;
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        if DECISION_KINDS.contains(&kind) {
            complexity += 1;
        }
        // for/while/try `else:` is one more path
        if kind == "else_clause"
            && node.parent().is_some_and(|p| {
                matches!(p.kind(), "for_statement" | "while_statement" | "try_statement")
            })
        {
            complexity += 1;
        }

        let mut cursor = node.walk();
        stack.extend(
            node.children(&mut cursor)
                .filter(|child| !SCOPE_KINDS.contains(&child.kind())),
        );
    }
    complexity
}

/// Halstead volume `N * log2(n)` over operator expressions in the module.
pub fn halstead_volume(module: &ParsedModule<'_>) -> f64 {
    let mut operators: Vec<&str> = Vec::new();
    let mut operands: Vec<&str> = Vec::new();

    for node in module.descendants() {
        match node.kind() {
            "binary_operator" | "boolean_operator" | "augmented_assignment" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    operators.push(module.text(op));
                }
                for field in ["left", "right"] {
                    if let Some(operand) = node.child_by_field_name(field) {
                        operands.push(module.text(operand));
                    }
                }
            }
            "unary_operator" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    operators.push(module.text(op));
                }
                if let Some(arg) = node.child_by_field_name("argument") {
                    operands.push(module.text(arg));
                }
            }
            "not_operator" => {
                operators.push("not");
                if let Some(arg) = node.child_by_field_name("argument") {
                    operands.push(module.text(arg));
                }
            }
            "comparison_operator" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() {
                        operands.push(module.text(child));
                    } else {
                        operators.push(module.text(child));
                    }
                }
            }
            _ => {}
        }
    }

    let distinct_operators: HashSet<_> = operators.iter().collect();
    let distinct_operands: HashSet<_> = operands.iter().collect();
    let vocabulary = distinct_operators.len() + distinct_operands.len();
    let length = operators.len() + operands.len();

    if vocabulary == 0 {
        0.0
    } else {
        length as f64 * (vocabulary as f64).log2()
    }
}

/// Statements plus definition and clause headers.
pub fn logical_lines(module: &ParsedModule<'_>) -> usize {
    module
        .descendants()
        .iter()
        .filter(|node| {
            let kind = node.kind();
            node.is_named()
                && (kind.ends_with("_statement")
                    || SCOPE_KINDS.contains(&kind)
                    || CLAUSE_KINDS.contains(&kind))
        })
        .count()
}

#[derive(Debug, Default, PartialEq, Eq)]
struct LineCounts {
    /// Non-blank lines that are not purely comments or docstrings.
    source: usize,
    /// Lines carrying a comment.
    comments: usize,
    /// Lines spanned by standalone string statements.
    multiline_strings: usize,
}

impl LineCounts {
    fn of(module: &ParsedModule<'_>) -> Self {
        let mut comment_rows = BTreeSet::new();
        let mut string_rows = BTreeSet::new();
        let mut code_rows = BTreeSet::new();

        for node in module.descendants() {
            match node.kind() {
                "comment" => {
                    comment_rows.insert(node.start_position().row);
                }
                "expression_statement" if is_bare_string(node) => {
                    string_rows.extend(node.start_position().row..=node.end_position().row);
                }
                _ if node.child_count() == 0 && !node.is_extra() => {
                    code_rows.insert(node.start_position().row);
                }
                _ => {}
            }
        }

        // Tokens of a bare string statement are not code
        let source = code_rows.difference(&string_rows).count();

        Self {
            source,
            comments: comment_rows.len(),
            multiline_strings: string_rows.len(),
        }
    }
}

fn is_bare_string(statement: Node<'_>) -> bool {
    statement.named_child_count() == 1
        && statement
            .named_child(0)
            .is_some_and(|child| child.kind() == "string")
}

/// Maintainability index on a 0..=100 scale.
///
/// `comment_percent` is in percent of source lines. Trivially small input
/// (no measurable volume or no logical lines) scores 100.
pub fn maintainability_index(
    halstead_volume: f64,
    total_complexity: f64,
    logical_loc: f64,
    comment_percent: f64,
) -> f64 {
    if halstead_volume <= 0.0 || logical_loc <= 0.0 {
        return 100.0;
    }

    let comment_scale = (2.46 * comment_percent.to_radians()).sqrt();
    let raw = 171.0 - 5.2 * halstead_volume.ln() - 0.23 * total_complexity
        - 16.2 * logical_loc.ln()
        + 50.0 * comment_scale.sin();

    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn complexity_of(source: &str, name: &str) -> u32 {
        let module = python::parse(source).unwrap();
        let function = module
            .functions()
            .into_iter()
            .find(|f| module.name(*f) == name)
            .unwrap();
        cyclomatic_complexity(function)
    }

    #[test]
    fn test_straight_line_function_is_one() {
        assert_eq!(complexity_of("def f(x):\n    return x + 1\n", "f"), 1);
    }

    #[test]
    fn test_branches_and_loops() {
        let source = indoc! {r#"
            def classify(items):
                result = []
                for item in items:
                    if item > 10 and item < 100:
                        result.append("mid")
                    elif item >= 100:
                        result.append("big")
                    else:
                        result.append("small")
                while result:
                    result.pop()
                return [x for x in items if x]
        "#};
        // 1 + for + if + and + elif + while + comprehension for + comprehension if
        assert_eq!(complexity_of(source, "classify"), 8);
    }

    #[test]
    fn test_try_handlers_and_else() {
        let source = indoc! {r#"
            def load(path):
                try:
                    data = read(path)
                except OSError:
                    return None
                except ValueError:
                    return {}
                else:
                    return data
        "#};
        assert_eq!(complexity_of(source, "load"), 4);
    }

    #[test]
    fn test_nested_function_is_measured_separately() {
        let source = indoc! {r#"
            def outer(flag):
                def inner(x):
                    if x:
                        return 1
                    return 0
                return inner(flag)
        "#};
        assert_eq!(complexity_of(source, "outer"), 1);
        assert_eq!(complexity_of(source, "inner"), 2);
    }

    #[test]
    fn test_halstead_volume() {
        // operators: + (x2) -> 1 distinct, 2 total
        // operands: a, b, a + b, c -> 4 distinct, 4 total
        let module = python::parse("x = a + b + c\n").unwrap();
        let expected = 6.0 * (5.0f64).log2();
        assert!((halstead_volume(&module) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_operators_means_zero_volume() {
        let module = python::parse("import os\nname = os.name\n").unwrap();
        assert_eq!(halstead_volume(&module), 0.0);
    }

    #[test]
    fn test_logical_lines() {
        let source = indoc! {r#"
            import os

            def f(x):
                if x:
                    return 1
                else:
                    return 2
        "#};
        let module = python::parse(source).unwrap();
        // import, def, if, return, else, return
        assert_eq!(logical_lines(&module), 6);
        assert_eq!(module.nodes_of_kind("else_clause").len(), 1);
    }

    #[test]
    fn test_line_counts() {
        let source = indoc! {r#"
            """Module docstring
            spanning two lines."""

            # a comment
            x = 1  # trailing
            y = 2
        "#};
        let module = python::parse(source).unwrap();
        assert_eq!(
            LineCounts::of(&module),
            LineCounts {
                source: 2,
                comments: 2,
                multiline_strings: 2,
            }
        );
    }

    #[test]
    fn test_maintainability_index_trivial_code_is_perfect() {
        assert_eq!(maintainability_index(0.0, 1.0, 3.0, 0.0), 100.0);
        assert_eq!(maintainability_index(10.0, 1.0, 0.0, 0.0), 100.0);
    }

    #[test]
    fn test_maintainability_index_formula() {
        let mi = maintainability_index(100.0, 5.0, 20.0, 0.0);
        let expected = (171.0 - 5.2 * 100f64.ln() - 0.23 * 5.0 - 16.2 * 20f64.ln()) * 100.0 / 171.0;
        assert!((mi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_maintainability_index_is_clamped() {
        assert_eq!(maintainability_index(1e12, 500.0, 1e6, 0.0), 0.0);
        assert!(maintainability_index(2.0, 0.0, 1.0, 50.0) <= 100.0);
    }

    #[test]
    fn test_measure_small_module() {
        let source = "def add(a, b):\n    \"\"\"Add.\"\"\"\n    return a + b\n";
        let metrics = NativeMetrics.measure(source).unwrap();

        assert_eq!(metrics.function_complexities.len(), 1);
        assert_eq!(metrics.function_complexities[0].name, "add");
        assert_eq!(metrics.average_complexity(), 1.0);
        let mi = metrics.maintainability_index.unwrap();
        assert!(mi > 80.0 && mi <= 100.0, "mi = {}", mi);
    }

    #[test]
    fn test_measure_rejects_invalid_source() {
        assert!(matches!(
            NativeMetrics.measure("def (:"),
            Err(MetricsError::Syntax(_))
        ));
    }
}
