//! Deterministic production-readiness scoring.
//!
//! Maps an [`EvaluationRecord`] to a weighted 0..=100 score plus up to 10
//! bonus points. Everything here is a pure function of the record.

pub mod types;

use crate::analysis::{ErrorHandlingFacts, EvaluationRecord, SecurityFindings, TestFacts};
use crate::features::Feature;
pub use types::{Breakdown, Category, CategoryPoints, Rating, ScoreRecord, MAX_BONUS, MAX_SCORE};

/// Points per satisfied excellence condition.
const BONUS_STEP: u32 = 2;

/// Security cap applied to an unverified scan under strict security.
const UNVERIFIED_SECURITY_CAP: u32 = 10;

/// Scoring engine. Stateless apart from policy toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    /// Cap the security category when the scanner could not run.
    pub strict_security: bool,
}

impl Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy from the enabled feature flags.
    pub fn from_features() -> Self {
        Self {
            strict_security: Feature::StrictSecurity.is_enabled(),
        }
    }

    pub fn with_strict_security(mut self, strict: bool) -> Self {
        self.strict_security = strict;
        self
    }

    pub fn score(&self, record: &EvaluationRecord) -> ScoreRecord {
        if !record.syntax_ok {
            return ScoreRecord::syntax_failure();
        }

        let mut security = security_points(&record.security);
        if self.strict_security && !record.security.is_verified() {
            security = security.min(UNVERIFIED_SECURITY_CAP);
        }

        let mut points = CategoryPoints {
            syntax: Category::Syntax.max_points(),
            documentation: if record.has_docstrings {
                Category::Documentation.max_points()
            } else {
                0
            },
            complexity: complexity_points(record.avg_complexity),
            security,
            error_handling: error_handling_points(&record.error_handling),
            tests: test_points(&record.tests),
            maintainability: maintainability_points(record.maintainability.index),
            excellence_bonus: 0,
        };

        let bonus_reasons = excellence_bonus(record);
        points.excellence_bonus = (bonus_reasons.len() as u32 * BONUS_STEP).min(MAX_BONUS);

        let total = points.base_total() + points.excellence_bonus;
        ScoreRecord {
            total,
            max: MAX_SCORE,
            percentage: (total as f64 / MAX_SCORE as f64 * 1000.0).round() / 10.0,
            rating: Rating::from_total(total),
            breakdown: Breakdown::Scored(points),
            bonus_reasons,
        }
    }
}

/// Score with the default policy.
pub fn score(record: &EvaluationRecord) -> ScoreRecord {
    Scorer::default().score(record)
}

/// Graduated by average cyclomatic complexity. 0 (nothing measured) counts
/// as best case.
pub fn complexity_points(avg_complexity: f64) -> u32 {
    match avg_complexity {
        c if c <= 3.0 => 15,
        c if c <= 5.0 => 13,
        c if c <= 7.0 => 11,
        c if c <= 10.0 => 8,
        c if c <= 15.0 => 4,
        _ => 0,
    }
}

/// Zero issues is full marks. High-severity issues dominate, costing 10 each,
/// but never score above what the same number of lesser issues would.
/// Medium/low issues cost 2 each with a floor of 5.
///
/// So the high-severity rate is not applied on its own: 10 findings with one
/// high scores 5, not 10. The cap keeps points non-increasing as findings grow.
pub fn security_points(findings: &SecurityFindings) -> u32 {
    let max = Category::Security.max_points() as i64;
    let count = findings.issue_count as i64;
    let high = findings.high_severity_count as i64;

    if count == 0 {
        return max as u32;
    }

    let lesser = (max - 2 * count).max(5);
    let points = if high > 0 {
        (max - 10 * high).max(0).min(lesser)
    } else {
        lesser
    };
    points as u32
}

/// Additive: try/except 3, plus 2 when no handler is bare. Each bare except
/// costs a point instead. Logging 2, validation 2, custom exceptions 1.
pub fn error_handling_points(facts: &ErrorHandlingFacts) -> u32 {
    let mut points: i64 = 0;
    if facts.has_try_except {
        points += 3;
        if facts.bare_except_count == 0 {
            points += 2;
        }
    }
    if facts.bare_except_count > 0 {
        points = (points - facts.bare_except_count as i64).max(0);
    }
    if facts.has_logging {
        points += 2;
    }
    if facts.has_validation {
        points += 2;
    }
    if facts.has_custom_exceptions {
        points += 1;
    }
    points.clamp(0, Category::ErrorHandling.max_points() as i64) as u32
}

pub fn test_points(facts: &TestFacts) -> u32 {
    if !facts.has_tests {
        return 0;
    }
    let functions = facts.test_function_count;
    let assertions = facts.assertion_count;
    if functions >= 5 && assertions >= 10 {
        10
    } else if functions >= 3 && assertions >= 5 {
        8
    } else if assertions > 0 {
        6
    } else {
        3
    }
}

pub fn maintainability_points(index: f64) -> u32 {
    match index {
        i if i >= 80.0 => 10,
        i if i >= 70.0 => 8,
        i if i >= 60.0 => 6,
        i if i >= 40.0 => 4,
        i if i >= 20.0 => 2,
        _ => 0,
    }
}

/// Reasons for each satisfied excellence condition, in fixed order.
pub fn excellence_bonus(record: &EvaluationRecord) -> Vec<String> {
    let security = &record.security;
    let tests = &record.tests;
    let errors = &record.error_handling;

    let conditions = [
        (
            security.issue_count == 0 && security.is_verified() && record.function_count > 3,
            "Zero security vulnerabilities",
        ),
        (
            record.avg_complexity > 0.0 && record.avg_complexity <= 3.0,
            "Exceptional code simplicity",
        ),
        (
            tests.test_function_count >= 5 && tests.assertion_count >= 15,
            "Comprehensive test coverage",
        ),
        (
            record.maintainability.index >= 80.0,
            "Outstanding maintainability (Good range)",
        ),
        (
            errors.has_custom_exceptions && errors.has_logging && errors.has_validation,
            "Advanced error handling",
        ),
    ];

    conditions
        .into_iter()
        .filter(|(met, _)| *met)
        .map(|(_, reason)| reason.to_string())
        .collect()
}
