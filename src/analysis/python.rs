//! Tree-sitter based Python parsing.
//!
//! Wraps the grammar with the handful of queries the extractors need:
//! function/class enumeration, docstring lookup and plain node walking.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A language mismatch surfaces as a failed parse below
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Source that could not be parsed as Python.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line}, column {column})")]
pub struct SyntaxError {
    /// 1-based line of the first offending node.
    pub line: usize,
    /// 1-based column of the first offending node.
    pub column: usize,
    pub message: String,
}

/// A successfully parsed module borrowing its source text.
pub struct ParsedModule<'src> {
    tree: Tree,
    source: &'src str,
}

/// Parse `source`, rejecting any tree that contains error or missing nodes.
pub fn parse(source: &str) -> Result<ParsedModule<'_>, SyntaxError> {
    let tree = PYTHON_PARSER
        .with(|p| p.borrow_mut().parse(source, None))
        .ok_or_else(|| SyntaxError {
            line: 1,
            column: 1,
            message: "parser produced no tree".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root, source));
    }
    if let Some(err) = legacy_syntax(root, source) {
        return Err(err);
    }

    Ok(ParsedModule { tree, source })
}

/// True when `source` parses cleanly.
pub fn is_valid(source: &str) -> bool {
    parse(source).is_ok()
}

fn first_error(root: Node<'_>, source: &str) -> SyntaxError {
    let offending = descendants_of(root)
        .into_iter()
        .find(|node| node.is_error() || node.is_missing())
        .unwrap_or(root);

    let position = offending.start_position();
    let message = if offending.is_missing() {
        format!("invalid syntax: missing '{}'", offending.kind())
    } else {
        let snippet = offending
            .utf8_text(source.as_bytes())
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .trim();
        if snippet.is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near '{}'", crate::utils::truncate(snippet, 40))
        }
    };

    SyntaxError {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

/// The grammar still accepts a few Python 2 forms that Python 3 rejects.
fn legacy_syntax(root: Node<'_>, source: &str) -> Option<SyntaxError> {
    descendants_of(root).into_iter().find_map(|node| {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let message = match node.kind() {
            "print_statement" => "Missing parentheses in call to 'print'",
            "exec_statement" => "Missing parentheses in call to 'exec'",
            "except_clause" if has_comma_child(node) => {
                "multiple exception types must be parenthesized"
            }
            // Comprehension over a bare tuple, e.g. `f(x for x in y, 1)`
            "for_in_clause" if has_comma_child(node) => {
                "Generator expression must be parenthesized"
            }
            "string_start" if text == "`" => "invalid syntax: backquote repr is not supported",
            "integer" => integer_error(text)?,
            _ => return None,
        };
        let position = node.start_position();
        Some(SyntaxError {
            line: position.row + 1,
            column: position.column + 1,
            message: message.to_string(),
        })
    })
}

fn has_comma_child(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == ",");
    found
}

/// Python 3 rejects the `L` suffix and leading zeros on non-zero decimals.
/// Imaginary literals may keep leading zeros.
fn integer_error(literal: &str) -> Option<&'static str> {
    if literal.ends_with(['l', 'L']) {
        return Some("invalid decimal literal");
    }
    let lower = literal.to_ascii_lowercase();
    if lower.ends_with('j') || ["0x", "0o", "0b"].iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    let leading_zero = literal.starts_with('0')
        && literal.chars().any(|c| c.is_ascii_digit() && c != '0');
    leading_zero.then_some("leading zeros in decimal integer literals are not permitted")
}

/// Pre-order walk of `node` and everything below it.
pub(crate) fn descendants_of(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// True for `async def` definitions.
pub fn is_async(function: Node<'_>) -> bool {
    function
        .child(0)
        .map(|first| first.kind() == "async")
        .unwrap_or(false)
}

/// f-strings and bytes never count as docstrings.
fn is_plain_string(literal: &str) -> bool {
    let prefix: String = literal
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    !prefix.contains('f') && !prefix.contains('b')
}

impl<'src> ParsedModule<'src> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn text(&self, node: Node<'_>) -> &'src str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Every node in the module, pre-order.
    pub fn descendants(&self) -> Vec<Node<'_>> {
        descendants_of(self.root())
    }

    pub fn nodes_of_kind(&self, kind: &str) -> Vec<Node<'_>> {
        self.descendants()
            .into_iter()
            .filter(|node| node.kind() == kind)
            .collect()
    }

    /// Plain `def` functions at any depth, including methods and nested
    /// functions. Coroutines (`async def`) are left out.
    pub fn functions(&self) -> Vec<Node<'_>> {
        self.nodes_of_kind("function_definition")
            .into_iter()
            .filter(|function| !is_async(*function))
            .collect()
    }

    pub fn classes(&self) -> Vec<Node<'_>> {
        self.nodes_of_kind("class_definition")
    }

    /// Identifier of a function or class definition.
    pub fn name(&self, definition: Node<'_>) -> &'src str {
        definition
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or("")
    }

    /// Methods declared directly in a class body, decorated or not.
    pub fn direct_methods<'t>(&self, class: Node<'t>) -> Vec<Node<'t>> {
        let Some(body) = class.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter_map(|child| match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child
                    .child_by_field_name("definition")
                    .filter(|def| def.kind() == "function_definition"),
                _ => None,
            })
            .collect()
    }

    /// Non-empty docstring of a module, class or function node.
    pub fn docstring(&self, node: Node<'_>) -> Option<&'src str> {
        let body = if node.kind() == "module" {
            node
        } else {
            node.child_by_field_name("body")?
        };

        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;
        if first.kind() != "expression_statement" {
            return None;
        }

        let string = first.named_child(0)?;
        if string.kind() != "string" || !is_plain_string(self.text(string)) {
            return None;
        }

        let mut cursor = string.walk();
        let content = string
            .named_children(&mut cursor)
            .find(|part| part.kind() == "string_content")
            .map(|part| self.text(part).trim())?;

        (!content.is_empty()).then_some(content)
    }
}
