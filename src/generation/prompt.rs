//! Prompts sent to the generation provider.

use std::fmt::Write;

use crate::analysis::EvaluationRecord;
use crate::scoring::ScoreRecord;

pub const GENERATION_SYSTEM_PROMPT: &str = "\
You are an expert Python developer who writes production-ready code with:
- Clean, modular architecture following SOLID principles
- Error handling with try/except blocks and meaningful custom exceptions
- Docstrings for every function and class
- Unit tests with assertions
- Type hints
- Logging for debugging
- Input validation
- Security best practices (no hardcoded credentials, no injection vulnerabilities)

Return ONLY the Python code, without markdown formatting or explanations.";

pub const IMPROVEMENT_SYSTEM_PROMPT: &str = "\
You are an expert Python developer focused on code quality.
Given code together with the problems found by automated analysis, produce improved code that \
fixes ALL of them while keeping the original functionality.
Apply each recommendation precisely and completely.
Return ONLY the complete improved Python code, without explanations.";

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Improvement request embedding the task, the current code, the current
/// analysis snapshot and every recommendation, numbered.
pub fn build_improvement_prompt(
    task: &str,
    code: &str,
    record: &EvaluationRecord,
    score: &ScoreRecord,
    recommendations: &[String],
) -> String {
    let mut prompt = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        prompt,
        "TASK: Improve the following Python code based on the quality analysis below.\n"
    );
    let _ = writeln!(prompt, "ORIGINAL REQUIREMENT:\n{}\n", task);
    let _ = writeln!(prompt, "CURRENT CODE:\n{}\n", code);

    let _ = writeln!(prompt, "QUALITY ANALYSIS RESULTS:");
    let _ = writeln!(
        prompt,
        "- Production Score: {}/{} ({})",
        score.total, score.max, score.rating
    );
    let _ = writeln!(prompt, "- Syntax Valid: {}", yes_no(record.syntax_ok));
    let _ = writeln!(prompt, "- Has Docstrings: {}", yes_no(record.has_docstrings));
    let _ = writeln!(prompt, "- Avg Complexity: {}", record.avg_complexity);
    let _ = writeln!(prompt, "- Security Issues: {}", record.security.issue_count);
    let _ = writeln!(
        prompt,
        "- Has Error Handling: {}",
        yes_no(record.error_handling.has_try_except)
    );
    let _ = writeln!(prompt, "- Has Tests: {}", yes_no(record.tests.has_tests));
    let _ = writeln!(
        prompt,
        "- Maintainability Index: {}\n",
        record.maintainability.index
    );

    let _ = writeln!(prompt, "RECOMMENDATIONS TO APPLY:");
    for (i, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, rec);
    }

    let _ = write!(
        prompt,
        "
INSTRUCTIONS:
You MUST address ALL {} recommendations listed above. For each one:
- Apply the specific fix it describes
- Keep all original functionality
- Introduce no breaking changes

Additionally:
1. Give every function and class a docstring
2. Handle errors with try/except blocks
3. Validate inputs of user-facing functions
4. Add logging statements
5. Include unit tests with assertions
6. Follow SOLID principles
7. Keep cyclomatic complexity below 10 for every function
8. Fix any security vulnerabilities

Return ONLY the complete improved Python code without explanations or markdown formatting.
",
        recommendations.len()
    );

    prompt
}
