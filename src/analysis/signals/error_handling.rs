use std::sync::OnceLock;

use regex::Regex;
use tree_sitter::Node;

use crate::analysis::python::ParsedModule;
use crate::analysis::types::ErrorHandlingFacts;

static LOGGING_RE: OnceLock<Regex> = OnceLock::new();
static VALIDATION_RE: OnceLock<Regex> = OnceLock::new();

fn logging_re() -> &'static Regex {
    LOGGING_RE.get_or_init(|| Regex::new(r"import logging|from logging").unwrap())
}

fn validation_re() -> &'static Regex {
    VALIDATION_RE.get_or_init(|| {
        Regex::new(r"isinstance\(|ValueError|TypeError|assert.*>|assert.*<").unwrap()
    })
}

/// Detect exception handling, logging and input validation patterns.
///
/// Logging and validation are plain text matches over the whole source, so a
/// mention inside a string or comment counts too.
pub fn extract_error_handling(module: &ParsedModule<'_>) -> ErrorHandlingFacts {
    let source = module.source();
    let nodes = module.descendants();

    let exception_block_count = nodes
        .iter()
        .filter(|n| n.kind() == "try_statement")
        .count();

    let bare_except_count = nodes
        .iter()
        .filter(|n| n.kind() == "except_clause" && is_bare_except(**n))
        .count();

    let has_custom_exceptions = nodes
        .iter()
        .filter(|n| n.kind() == "class_definition")
        .any(|class| derives_from_exception(module, *class));

    ErrorHandlingFacts {
        has_try_except: exception_block_count > 0,
        has_custom_exceptions,
        has_logging: logging_re().is_match(source),
        exception_block_count,
        bare_except_count,
        has_validation: validation_re().is_match(source),
    }
}

/// `except:` with no exception type; only the handler body is named.
fn is_bare_except(clause: Node<'_>) -> bool {
    let mut cursor = clause.walk();
    let bare = clause
        .named_children(&mut cursor)
        .all(|child| matches!(child.kind(), "block" | "comment"));
    bare
}

/// A class whose direct base is a plain name mentioning `Exception`.
fn derives_from_exception(module: &ParsedModule<'_>, class: Node<'_>) -> bool {
    let Some(bases) = class.child_by_field_name("superclasses") else {
        return false;
    };
    let mut cursor = bases.walk();
    let found = bases
        .named_children(&mut cursor)
        .any(|base| base.kind() == "identifier" && module.text(base).contains("Exception"));
    found
}
