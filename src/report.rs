//! Report formatting for evaluation, generation and improvement results.

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;

use crate::analysis::EvaluationRecord;
use crate::refine::{HistoryEntry, ImprovementSummary, RefinementOutcome};
use crate::scoring::{Category, ScoreRecord};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console report.
    #[default]
    Pretty,
    /// JSON output.
    Json,
    /// Markdown project documentation.
    Markdown,
}

#[derive(Serialize)]
struct EvaluationView<'a> {
    evaluation: &'a EvaluationRecord,
    score: &'a ScoreRecord,
    recommendations: &'a [String],
}

/// Format a single evaluation.
pub fn format_evaluation(
    evaluation: &EvaluationRecord,
    score: &ScoreRecord,
    recommendations: &[String],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Pretty => {
            let mut output = header("CODE QUALITY REPORT");
            output.push_str(&format_details(evaluation, score, recommendations));
            output
        }
        OutputFormat::Json => to_json(&EvaluationView {
            evaluation,
            score,
            recommendations,
        }),
        OutputFormat::Markdown => render_documentation_at(
            "Evaluate existing code",
            None,
            evaluation,
            score,
            recommendations,
            &[],
            Local::now(),
        ),
    }
}

/// Format the result of generating (and refining) code for `task`.
pub fn format_outcome(
    task: &str,
    outcome: &RefinementOutcome,
    recommendations: &[String],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Pretty => {
            let mut output = header("CODE GENERATION & QUALITY REPORT");
            output.push_str(&format!("\nTask:\n{}\n\n", task));
            output.push_str(&format_progression(&outcome.history));
            output.push_str(&format!(
                "Stopped after {} iteration(s): {}\n\n",
                outcome.iterations, outcome.stop_reason
            ));
            output.push_str(&section("FINAL CODE"));
            output.push_str(&outcome.code);
            output.push_str("\n\n");
            output.push_str(&format_details(
                &outcome.evaluation,
                &outcome.score,
                recommendations,
            ));
            output
        }
        OutputFormat::Json => to_json(outcome),
        OutputFormat::Markdown => render_documentation(
            task,
            &outcome.code,
            &outcome.evaluation,
            &outcome.score,
            recommendations,
            &outcome.history,
        ),
    }
}

/// Format the result of improving existing code.
pub fn format_improvement(task: &str, summary: &ImprovementSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => {
            let mut output = header("IMPROVEMENT REPORT");
            output.push_str(&format!(
                "\nOriginal Score: {}/{} ({})\n",
                summary.original_score.total, summary.original_score.max, summary.original_score.rating
            ));
            output.push_str(&format!(
                "Final Score:    {}/{} ({})\n",
                summary.final_score.total, summary.final_score.max, summary.final_score.rating
            ));
            output.push_str(&format!("Improvement:    {:+} points\n", summary.delta()));
            output.push_str(&format!(
                "Iterations:     {} ({})\n",
                summary.iterations, summary.stop_reason
            ));
            output.push_str(&format!(
                "Recommendations: {} applied, {} remaining\n\n",
                summary.recommendations_applied.len(),
                summary.recommendations.len()
            ));
            output.push_str(&format_progression(&summary.history));
            output.push_str(&section("IMPROVED CODE"));
            output.push_str(&summary.improved_code);
            output.push_str("\n\n");
            output.push_str(&format_details(
                &summary.final_evaluation,
                &summary.final_score,
                &summary.recommendations,
            ));
            output
        }
        OutputFormat::Json => to_json(summary),
        OutputFormat::Markdown => render_documentation(
            task,
            &summary.improved_code,
            &summary.final_evaluation,
            &summary.final_score,
            &summary.recommendations,
            &summary.history,
        ),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

fn header(title: &str) -> String {
    format!("{}\n{}\n{}\n", "=".repeat(60), title, "=".repeat(60))
}

fn section(title: &str) -> String {
    format!("{}\n{}\n{}\n", "-".repeat(60), title, "-".repeat(60))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn format_progression(history: &[HistoryEntry]) -> String {
    if history.len() < 2 {
        return String::new();
    }
    let mut output = section("IMPROVEMENT PROGRESSION");
    for entry in history {
        output.push_str(&format!(
            "   Iteration {}: {}/100 ({})\n",
            entry.iteration, entry.score, entry.rating
        ));
    }
    output.push('\n');
    output
}

fn format_details(evaluation: &EvaluationRecord, score: &ScoreRecord, recommendations: &[String]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "PRODUCTION READINESS SCORE: {}/{} ({}%)\n",
        score.total, score.max, score.percentage
    ));
    output.push_str(&format!("   Rating: {}\n", score.rating));

    output.push_str("\nSCORE BREAKDOWN:\n");
    if score.breakdown.is_syntax_fail() {
        output.push_str("   - Syntax: FAIL\n");
    } else {
        for category in Category::ALL {
            output.push_str(&format!(
                "   - {}: {}/{}\n",
                category.label(),
                score.breakdown.points(category),
                category.max_points()
            ));
        }
    }
    for reason in &score.bonus_reasons {
        output.push_str(&format!("   + {}\n", reason));
    }

    output.push_str("\nBASIC METRICS:\n");
    output.push_str(&format!("   - Syntax Valid: {}\n", yes_no(evaluation.syntax_ok)));
    if let Some(error) = &evaluation.syntax_error {
        output.push_str(&format!("   - Syntax Error: {}\n", error));
    }
    output.push_str(&format!("   - Functions: {}\n", evaluation.function_count));
    output.push_str(&format!("   - Avg Complexity: {}\n", evaluation.avg_complexity));
    output.push_str(&format!("   - Has Docstrings: {}\n", yes_no(evaluation.has_docstrings)));

    if evaluation.syntax_ok {
        let mi = &evaluation.maintainability;
        output.push_str("\nMAINTAINABILITY INDEX:\n");
        output.push_str(&format!("   - Score: {} - {}\n", mi.index, mi.rating));
        output.push_str(&format!("   - Halstead Volume: {:.2}\n", mi.halstead_volume));
        output.push_str(&format!("   - Logical LOC: {}\n", mi.logical_loc));
        if let Some(error) = &mi.error {
            output.push_str(&format!("   Warning: {}\n", error));
        }

        let sec = &evaluation.security;
        output.push_str("\nSECURITY ANALYSIS:\n");
        match &sec.error {
            Some(error) => output.push_str(&format!("   Warning: {}\n", error)),
            None => {
                output.push_str(&format!("   - Total Issues: {}\n", sec.issue_count));
                output.push_str(&format!("   - High Severity: {}\n", sec.high_severity_count));
                for issue in sec.issues.iter().take(3) {
                    output.push_str(&format!(
                        "     - Line {}: {} [{}]\n",
                        issue.line, issue.message, issue.severity
                    ));
                }
            }
        }

        let err = &evaluation.error_handling;
        output.push_str("\nERROR HANDLING:\n");
        output.push_str(&format!("   - Try-Except Blocks: {}\n", err.exception_block_count));
        output.push_str(&format!(
            "   - Bare Except: {}{}\n",
            err.bare_except_count,
            if err.bare_except_count > 0 { " (avoid!)" } else { "" }
        ));
        output.push_str(&format!("   - Has Logging: {}\n", yes_no(err.has_logging)));
        output.push_str(&format!("   - Input Validation: {}\n", yes_no(err.has_validation)));

        let tests = &evaluation.tests;
        output.push_str("\nTEST COVERAGE:\n");
        output.push_str(&format!("   - Has Tests: {}\n", yes_no(tests.has_tests)));
        output.push_str(&format!("   - Test Functions: {}\n", tests.test_function_count));
        output.push_str(&format!("   - Assertions: {}\n", tests.assertion_count));
        if !tests.frameworks.is_empty() {
            output.push_str(&format!("   - Frameworks: {}\n", join(&tests.frameworks)));
        }

        let solid = &evaluation.structure;
        output.push_str("\nSOLID PRINCIPLES:\n");
        output.push_str(&format!("   - SRP Score: {:.1}/100\n", solid.srp_score));
        output.push_str(&format!("   - Classes: {}\n", solid.class_count));
        if !solid.god_classes.is_empty() {
            output.push_str(&format!(
                "   - God Classes (>10 methods): {}\n",
                join(&solid.god_classes)
            ));
        }
        if !solid.long_methods.is_empty() {
            output.push_str(&format!(
                "   - Long Methods (>50 lines): {}\n",
                join(&solid.long_methods)
            ));
        }
    }

    output.push_str("\nRECOMMENDATIONS:\n");
    if recommendations.is_empty() {
        output.push_str("   Code looks good! Consider peer review before deployment.\n");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        output.push_str(&format!("   {}. {}\n", i + 1, rec));
    }

    output
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Markdown project documentation stamped with the current local time.
pub fn render_documentation(
    task: &str,
    code: &str,
    evaluation: &EvaluationRecord,
    score: &ScoreRecord,
    recommendations: &[String],
    history: &[HistoryEntry],
) -> String {
    render_documentation_at(
        task,
        Some(code),
        evaluation,
        score,
        recommendations,
        history,
        Local::now(),
    )
}

/// Markdown project documentation. The code section is left out when
/// `code` is `None`.
pub fn render_documentation_at(
    task: &str,
    code: Option<&str>,
    evaluation: &EvaluationRecord,
    score: &ScoreRecord,
    recommendations: &[String],
    history: &[HistoryEntry],
    generated_at: DateTime<Local>,
) -> String {
    let mut doc = String::new();

    doc.push_str("# Auto-Generated Project Documentation\n\n");
    doc.push_str(&format!(
        "**Generated:** {}\n\n---\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    doc.push_str("## 1. Project Overview\n\n### Objective\n");
    doc.push_str(&format!("{}\n\n", task));
    doc.push_str("### Production Readiness\n");
    doc.push_str(&format!(
        "- **Overall Score:** {}/{} ({}%)\n",
        score.total, score.max, score.percentage
    ));
    doc.push_str(&format!("- **Status:** {}\n", score.rating));
    doc.push_str(&format!("- **Refinement Iterations:** {}\n\n---\n\n", history.len()));

    doc.push_str("## 2. Refinement History\n\n");
    if history.is_empty() {
        doc.push_str("No refinement was performed.\n\n");
    } else {
        doc.push_str("| Iteration | Score | Rating | Notes |\n");
        doc.push_str("|-----------|-------|--------|-------|\n");
        for entry in history {
            doc.push_str(&format!(
                "| {} | {}/100 | {} | {} |\n",
                entry.iteration,
                entry.score,
                entry.rating,
                crate::utils::truncate(&entry.reason, 50)
            ));
        }
        doc.push('\n');
    }

    doc.push_str("---\n\n## 3. Code Quality Metrics\n\n### Basic Metrics\n");
    doc.push_str(&format!("- **Functions:** {}\n", evaluation.function_count));
    doc.push_str(&format!("- **Syntax Valid:** {}\n", yes_no(evaluation.syntax_ok)));
    doc.push_str(&format!("- **Average Complexity:** {}\n", evaluation.avg_complexity));
    doc.push_str(&format!("- **Has Docstrings:** {}\n", yes_no(evaluation.has_docstrings)));

    let mi = &evaluation.maintainability;
    doc.push_str("\n### Maintainability\n");
    doc.push_str(&format!("- **Maintainability Index:** {} ({})\n", mi.index, mi.rating));
    doc.push_str(&format!("- **Halstead Volume:** {:.2}\n", mi.halstead_volume));
    doc.push_str(&format!("- **Logical Lines of Code:** {}\n", mi.logical_loc));

    let sec = &evaluation.security;
    doc.push_str("\n### Security\n");
    match &sec.error {
        Some(error) => doc.push_str(&format!("- **Scanner:** {}\n", error)),
        None => {
            doc.push_str(&format!("- **Total Issues:** {}\n", sec.issue_count));
            doc.push_str(&format!("- **High Severity:** {}\n", sec.high_severity_count));
            if !sec.issues.is_empty() {
                doc.push_str("\n**Issues Found:**\n");
                for issue in &sec.issues {
                    doc.push_str(&format!(
                        "  - Line {}: {} [{}]\n",
                        issue.line, issue.message, issue.severity
                    ));
                }
            }
        }
    }

    let err = &evaluation.error_handling;
    doc.push_str("\n### Error Handling\n");
    doc.push_str(&format!("- **Try-Except Blocks:** {}\n", err.exception_block_count));
    doc.push_str(&format!("- **Bare Except Clauses:** {}\n", err.bare_except_count));
    doc.push_str(&format!("- **Has Logging:** {}\n", yes_no(err.has_logging)));
    doc.push_str(&format!("- **Input Validation:** {}\n", yes_no(err.has_validation)));

    let tests = &evaluation.tests;
    doc.push_str("\n### Test Coverage\n");
    doc.push_str(&format!("- **Test Functions:** {}\n", tests.test_function_count));
    doc.push_str(&format!("- **Assertions:** {}\n", tests.assertion_count));
    doc.push_str(&format!(
        "- **Frameworks:** {}\n",
        if tests.frameworks.is_empty() {
            "None".to_string()
        } else {
            join(&tests.frameworks)
        }
    ));

    let solid = &evaluation.structure;
    doc.push_str("\n### SOLID Principles\n");
    doc.push_str(&format!("- **SRP Score:** {:.1}/100\n", solid.srp_score));
    doc.push_str(&format!("- **Class Count:** {}\n", solid.class_count));
    if !solid.god_classes.is_empty() {
        doc.push_str(&format!("- **God Classes:** {}\n", join(&solid.god_classes)));
    }
    if !solid.long_methods.is_empty() {
        doc.push_str(&format!("- **Long Methods:** {}\n", join(&solid.long_methods)));
    }

    doc.push_str("\n---\n\n## 4. Score Breakdown\n\n");
    if score.breakdown.is_syntax_fail() {
        doc.push_str("- **Syntax:** FAIL\n");
    } else {
        for category in Category::ALL {
            let points = score.breakdown.points(category);
            let max = category.max_points();
            doc.push_str(&format!(
                "- **{}:** {}/{} ({:.0}%)\n",
                category.label(),
                points,
                max,
                f64::from(points) / f64::from(max) * 100.0
            ));
        }
        for reason in &score.bonus_reasons {
            doc.push_str(&format!("- **Bonus:** {}\n", reason));
        }
    }

    doc.push_str("\n---\n\n## 5. Recommendations\n\n");
    if recommendations.is_empty() {
        doc.push_str("No major recommendations. Code is well-structured!\n");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", i + 1, rec));
    }

    if let Some(code) = code {
        doc.push_str(&format!(
            "\n---\n\n## 6. Generated Code\n\n```python\n{}\n```\n",
            code.trim_end()
        ));
    }

    doc.push_str(
        "\n---\n\n## Usage Notes\n\n\
         - Review security issues before deploying to production\n\
         - Run the included unit tests before integration\n\
         - Consider additional testing for edge cases\n\
         - Install `bandit` to enable the security scan\n",
    );

    doc
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::recommend::recommend;
    use crate::scoring::{score, Rating};
    use crate::test_utils::{baseline_record, polished_record};

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_pretty_evaluation() {
        let record = polished_record();
        let score = score(&record);
        let recs = recommend(&record);
        let output = format_evaluation(&record, &score, &recs, OutputFormat::Pretty);

        assert!(output.contains("PRODUCTION READINESS SCORE: 94/100"));
        assert!(output.contains("Rating: Excellent - Production Ready"));
        assert!(output.contains("   - Documentation: 15/15\n"));
        assert!(output.contains("   + Outstanding maintainability (Good range)\n"));
        assert!(output.contains("1. "));
    }

    #[test]
    fn test_pretty_syntax_failure() {
        let record = EvaluationRecord::syntax_failure("invalid syntax (line 1, column 4)");
        let score = score(&record);
        let output = format_evaluation(&record, &score, &[], OutputFormat::Pretty);

        assert!(output.contains("Syntax: FAIL"));
        assert!(output.contains("Syntax Error: invalid syntax (line 1, column 4)"));
        assert!(!output.contains("MAINTAINABILITY INDEX"));
    }

    #[test]
    fn test_json_evaluation() {
        let record = baseline_record();
        let score = score(&record);
        let output = format_evaluation(&record, &score, &["Add docs".to_string()], OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["score"]["total"], 55);
        assert_eq!(value["evaluation"]["syntax_ok"], true);
        assert_eq!(value["recommendations"][0], "Add docs");
    }

    #[test]
    fn test_documentation() {
        let record = polished_record();
        let score = score(&record);
        let history = vec![HistoryEntry {
            iteration: 1,
            score: 94,
            rating: Rating::Excellent,
            reason: "Continue refinement to reach exceptional quality from 94/100".to_string(),
            recommendation_count: 3,
        }];
        let doc = render_documentation_at(
            "sum a list",
            Some("def total(xs):\n    return sum(xs)\n"),
            &record,
            &score,
            &[],
            &history,
            fixed_time(),
        );

        assert!(doc.starts_with("# Auto-Generated Project Documentation\n\n**Generated:** 2024-03-01 12:30:00"));
        assert!(doc.contains("### Objective\nsum a list\n"));
        assert!(doc.contains("| 1 | 94/100 | Excellent - Production Ready |"));
        assert!(doc.contains("- **Documentation:** 15/15 (100%)"));
        assert!(doc.contains("No major recommendations."));
        assert!(doc.contains("```python\ndef total(xs):\n    return sum(xs)\n```"));
    }

    #[test]
    fn test_documentation_without_code() {
        let record = baseline_record();
        let doc = render_documentation_at(
            "task",
            None,
            &record,
            &score(&record),
            &[],
            &[],
            fixed_time(),
        );
        assert!(doc.contains("No refinement was performed."));
        assert!(!doc.contains("## 6. Generated Code"));
    }
}
