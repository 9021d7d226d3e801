//! Static analysis of Python source into an [`EvaluationRecord`].

pub mod python;
pub mod signals;
pub mod types;

use log::{debug, warn};

use crate::config::RefineConfig;
use signals::{
    extract_basics, extract_error_handling, extract_structure, extract_test_coverage, run_scan,
    BanditScanner, DisabledScanner, MetricsTool, NativeMetrics, SecurityScanner,
};
pub use types::{
    EvaluationRecord, ErrorHandlingFacts, Level, MaintainabilityFacts, MaintainabilityRating,
    SecurityFindings, SecurityIssue, StructureFacts, TestFacts,
};

/// Runs every extractor over a code sample and merges the results.
pub struct Evaluator {
    scanner: Box<dyn SecurityScanner>,
    metrics: Box<dyn MetricsTool>,
}

impl Evaluator {
    pub fn new(scanner: Box<dyn SecurityScanner>, metrics: Box<dyn MetricsTool>) -> Self {
        Self { scanner, metrics }
    }

    /// Bandit with the configured binary and timeout, native metrics.
    pub fn from_config(config: &RefineConfig) -> Self {
        Self::new(
            Box::new(BanditScanner::new(
                config.bandit_program.clone(),
                config.scan_timeout,
            )),
            Box::new(NativeMetrics),
        )
    }

    /// No external tools; every scan reports itself unavailable.
    pub fn offline() -> Self {
        Self::new(Box::new(DisabledScanner), Box::new(NativeMetrics))
    }

    /// Evaluate `source`. Never fails: tool problems end up as annotations on
    /// the record and invalid syntax yields a record with only the diagnostic.
    pub fn evaluate(&self, source: &str) -> EvaluationRecord {
        let module = match python::parse(source) {
            Ok(module) => module,
            Err(e) => {
                debug!("Syntax check failed: {}", e);
                return EvaluationRecord::syntax_failure(e.to_string());
            }
        };

        let basics = extract_basics(&module);

        let (avg_complexity, maintainability) = match self.metrics.measure(source) {
            Ok(metrics) => {
                let index = round2(metrics.maintainability_index.unwrap_or(0.0));
                (
                    round2(metrics.average_complexity()),
                    MaintainabilityFacts {
                        index,
                        halstead_volume: round2(metrics.halstead_volume),
                        logical_loc: metrics.logical_loc,
                        comment_lines: metrics.comment_lines,
                        rating: MaintainabilityRating::from_index(index),
                        error: None,
                    },
                )
            }
            Err(e) => {
                warn!("Metrics unavailable: {}", e);
                (0.0, MaintainabilityFacts::unavailable(e.to_string()))
            }
        };

        EvaluationRecord {
            syntax_ok: true,
            syntax_error: None,
            function_count: basics.function_count,
            has_docstrings: basics.has_docstrings,
            avg_complexity,
            security: run_scan(self.scanner.as_ref(), source),
            error_handling: extract_error_handling(&module),
            structure: extract_structure(&module),
            tests: extract_test_coverage(&module),
            maintainability,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Box::<BanditScanner>::default(), Box::new(NativeMetrics))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::signals::{CodeMetrics, MetricsError, ScanError};
    use indoc::indoc;

    struct FixedScanner(Vec<SecurityIssue>);

    impl SecurityScanner for FixedScanner {
        fn scan(&self, _source: &str) -> Result<Vec<SecurityIssue>, ScanError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenMetrics;

    impl MetricsTool for BrokenMetrics {
        fn measure(&self, _source: &str) -> Result<CodeMetrics, MetricsError> {
            Err(MetricsError::Tool("radon exploded".to_string()))
        }
    }

    #[test]
    fn test_syntax_error_short_circuits() {
        let record = Evaluator::offline().evaluate("def broken(:\n");
        assert!(!record.syntax_ok);
        assert!(record.syntax_error.is_some());
        assert_eq!(record.function_count, 0);
        // the scanner never ran, so there is no annotation either
        assert_eq!(record.security, SecurityFindings::default());
    }

    #[test]
    fn test_evaluate_collects_every_slice() {
        let source = indoc! {r#"
            import logging


            def divide(a, b):
                """Divide a by b."""
                if b == 0:
                    raise ValueError("b must not be zero")
                return a / b


            def test_divide():
                assert divide(4, 2) == 2
        "#};
        let evaluator = Evaluator::new(Box::new(FixedScanner(Vec::new())), Box::new(NativeMetrics));
        let record = evaluator.evaluate(source);

        assert!(record.syntax_ok);
        assert_eq!(record.function_count, 2);
        assert!(record.has_docstrings);
        // one branch in divide, one assert in the test
        assert_eq!(record.avg_complexity, 2.0);
        assert!(record.security.is_verified());
        assert!(record.error_handling.has_logging);
        assert!(record.error_handling.has_validation);
        assert!(!record.error_handling.has_try_except);
        assert_eq!(record.tests.test_function_count, 1);
        assert_eq!(record.structure.srp_score, 100.0);
        assert!(record.maintainability.index > 0.0);
        assert_eq!(
            record.maintainability.rating,
            MaintainabilityRating::from_index(record.maintainability.index)
        );
    }

    #[test]
    fn test_metrics_failure_degrades() {
        let evaluator = Evaluator::new(Box::new(FixedScanner(Vec::new())), Box::new(BrokenMetrics));
        let record = evaluator.evaluate("def f():\n    return 1\n");

        assert!(record.syntax_ok);
        assert_eq!(record.avg_complexity, 0.0);
        assert_eq!(record.maintainability.index, 0.0);
        assert_eq!(record.maintainability.rating, MaintainabilityRating::Critical);
        assert!(record.maintainability.error.unwrap().contains("radon exploded"));
    }

    #[test]
    fn test_offline_scan_is_annotated() {
        let record = Evaluator::offline().evaluate("x = 1\n");
        assert!(record.syntax_ok);
        assert!(!record.security.is_verified());
        assert_eq!(record.security.issue_count, 0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
