//! Improvement directives derived from an evaluation record.
//!
//! Output order is fixed and grouped by category: documentation, complexity,
//! security, error handling, tests, maintainability, structure, then the
//! proactive tail. It is not sorted by severity.

use crate::analysis::EvaluationRecord;

/// Long methods listed by name before the rest are elided.
const LONG_METHODS_SHOWN: usize = 3;

/// Ordered list of directives, one per unmet criterion.
///
/// Syntactically invalid code gets a single directive: nothing else in the
/// record was measured.
pub fn recommend(record: &EvaluationRecord) -> Vec<String> {
    if !record.syntax_ok {
        let detail = record
            .syntax_error
            .as_deref()
            .map(|e| format!(": {}", e))
            .unwrap_or_default();
        return vec![format!(
            "Fix the syntax error{} so the code can be parsed and analyzed",
            detail
        )];
    }

    let mut out = Vec::new();
    documentation(record, &mut out);
    complexity(record, &mut out);
    security(record, &mut out);
    error_handling(record, &mut out);
    tests(record, &mut out);
    maintainability(record, &mut out);
    structure(record, &mut out);
    proactive(record, &mut out);
    out
}

fn documentation(record: &EvaluationRecord, out: &mut Vec<String>) {
    if !record.has_docstrings {
        out.push(
            "Add docstrings to all functions and classes describing parameters, return values and raised exceptions"
                .to_string(),
        );
    }
}

fn complexity(record: &EvaluationRecord, out: &mut Vec<String>) {
    let avg = record.avg_complexity;
    if avg > 15.0 {
        out.push(format!(
            "Critical: refactor highly complex functions (average complexity {:.1} > 15) into smaller single-purpose functions",
            avg
        ));
    } else if avg > 10.0 {
        out.push(format!(
            "Refactor complex functions (average complexity {:.1} > 10) to improve readability and testability",
            avg
        ));
    } else if avg > 5.0 {
        out.push(format!(
            "Simplify moderately complex functions (average complexity {:.1}) for long-term maintainability",
            avg
        ));
    }
}

fn security(record: &EvaluationRecord, out: &mut Vec<String>) {
    let security = &record.security;
    let high = security.high_severity_count;
    let total = security.issue_count;

    if high > 0 {
        out.push(format!(
            "CRITICAL: fix {} high-severity security issue(s) immediately (injection, hardcoded secrets, unsafe deserialization)",
            high
        ));
    }
    if total > high {
        out.push(format!(
            "Address {} medium/low severity security issue(s) to harden the code",
            total - high
        ));
    }
    if total == 0 {
        out.push("Sanitize and validate every input that reaches a user-facing function".to_string());
        out.push("Add security headers and CSRF protection to any web endpoints".to_string());
    }
}

fn error_handling(record: &EvaluationRecord, out: &mut Vec<String>) {
    let facts = &record.error_handling;

    if !facts.has_try_except {
        out.push(
            "Add try/except error handling around I/O operations and external calls".to_string(),
        );
    }
    if facts.bare_except_count > 0 {
        out.push(format!(
            "Replace {} bare 'except:' clause(s) with specific exception types (ValueError, OSError, ...)",
            facts.bare_except_count
        ));
    }
    if !facts.has_validation {
        out.push(
            "Validate inputs with type and range checks to prevent runtime errors".to_string(),
        );
    }
    if !facts.has_custom_exceptions {
        out.push("Define custom exception classes for domain-specific failures".to_string());
    }
    if !facts.has_logging {
        out.push(
            "Add structured logging with appropriate levels (DEBUG, INFO, WARNING, ERROR)"
                .to_string(),
        );
    }
}

fn tests(record: &EvaluationRecord, out: &mut Vec<String>) {
    let tests = &record.tests;
    let count = tests.test_function_count;
    let assertions = tests.assertion_count;

    if !tests.has_tests {
        out.push(
            "Add unit tests with pytest or unittest covering normal, edge and error cases"
                .to_string(),
        );
    } else if count < 3 {
        out.push(format!(
            "Expand the test suite beyond {} test(s) with edge cases and error scenarios",
            count
        ));
    } else if assertions < count * 2 {
        out.push(format!(
            "Add more assertions per test (currently {} assertions across {} tests)",
            assertions, count
        ));
    }
}

fn maintainability(record: &EvaluationRecord, out: &mut Vec<String>) {
    let mi = &record.maintainability;
    let index = mi.index;
    let rating = mi.rating.label();

    if index < 20.0 {
        out.push(format!(
            "CRITICAL: maintainability index is extremely low ({:.1}/100, {}); restructure the code",
            index, rating
        ));
    } else if index < 60.0 {
        out.push(format!(
            "URGENT: maintainability index is low ({:.1}/100, {}); reduce complexity, add comments and improve structure",
            index, rating
        ));
    } else if index < 80.0 {
        out.push(format!(
            "Maintainability index is moderate ({:.1}/100, {}); targeted refactoring would raise it",
            index, rating
        ));
    } else if index < 90.0 {
        out.push(format!(
            "Maintainability is good ({:.1}/100); minor cleanups can make it excellent",
            index
        ));
    }
}

fn structure(record: &EvaluationRecord, out: &mut Vec<String>) {
    let structure = &record.structure;

    if !structure.god_classes.is_empty() {
        let names: Vec<_> = structure.god_classes.iter().map(String::as_str).collect();
        out.push(format!(
            "Split god class(es) {} into focused classes with a single responsibility",
            names.join(", ")
        ));
    }
    if !structure.long_methods.is_empty() {
        let names: Vec<_> = structure
            .long_methods
            .iter()
            .take(LONG_METHODS_SHOWN)
            .map(String::as_str)
            .collect();
        out.push(format!(
            "Break down long method(s) {} (>50 lines) into smaller functions",
            names.join(", ")
        ));
    }
    if structure.avg_methods_per_class > 10.0 {
        out.push(format!(
            "Classes average {:.1} methods; extract related methods into separate classes or modules",
            structure.avg_methods_per_class
        ));
    }
}

fn proactive(record: &EvaluationRecord, out: &mut Vec<String>) {
    out.push("Add runtime assertions and invariant checks for critical code paths".to_string());
    out.push("Profile the code to find performance bottlenecks".to_string());
    out.push("Monitor memory usage of resource-intensive operations".to_string());

    if record.error_handling.has_validation {
        out.push("Keep validating inputs at every public function boundary so failures surface early".to_string());
    } else {
        out.push("Use defensive programming: validate inputs at function boundaries to fail fast".to_string());
    }
    if record.function_count > 5 && !record.tests.has_tests {
        out.push("Add integration tests to verify how components interact".to_string());
    }

    out.push("Add type hints (PEP 484) for better tooling and static analysis".to_string());
    out.push("Run linters (pylint, flake8) and a formatter (black) for consistent style".to_string());
    out.push("Add pre-commit hooks to enforce quality checks before each commit".to_string());
}
