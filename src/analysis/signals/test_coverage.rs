use tree_sitter::Node;

use crate::analysis::python::{is_async, ParsedModule};
use crate::analysis::types::TestFacts;

const TEST_FRAMEWORKS: &[&str] = &["unittest", "pytest", "nose"];

/// Count test functions, assertions and imported test frameworks.
pub fn extract_test_coverage(module: &ParsedModule<'_>) -> TestFacts {
    let mut facts = TestFacts::default();

    for node in module.descendants() {
        match node.kind() {
            "import_statement" => {
                for name in imported_names(module, node) {
                    if is_framework(name) {
                        facts.frameworks.insert(name.to_string());
                    }
                }
            }
            "import_from_statement" => {
                if let Some(from) = node.child_by_field_name("module_name") {
                    let name = module.text(from);
                    if is_framework(name) {
                        facts.frameworks.insert(name.to_string());
                    }
                }
            }
            "function_definition"
                if module.name(node).starts_with("test_") && !is_async(node) =>
            {
                facts.test_function_count += 1;
            }
            "assert_statement" => facts.assertion_count += 1,
            "call" if is_assert_method_call(module, node) => facts.assertion_count += 1,
            _ => {}
        }
    }

    facts.has_tests = facts.test_function_count > 0;
    facts
}

fn is_framework(name: &str) -> bool {
    TEST_FRAMEWORKS.iter().any(|fw| name.contains(fw))
}

/// Module names of `import a, b.c as d`.
fn imported_names<'src>(module: &ParsedModule<'src>, import: Node<'_>) -> Vec<&'src str> {
    let mut cursor = import.walk();
    let names = import
        .children_by_field_name("name", &mut cursor)
        .map(|name| match name.kind() {
            "aliased_import" => name
                .child_by_field_name("name")
                .map(|n| module.text(n))
                .unwrap_or(""),
            _ => module.text(name),
        })
        .collect();
    names
}

/// `self.assertEqual(...)`, `mock.assert_called_once()` and friends.
fn is_assert_method_call(module: &ParsedModule<'_>, call: Node<'_>) -> bool {
    call.child_by_field_name("function")
        .filter(|f| f.kind() == "attribute")
        .and_then(|f| f.child_by_field_name("attribute"))
        .map(|attr| module.text(attr).starts_with("assert"))
        .unwrap_or(false)
}
