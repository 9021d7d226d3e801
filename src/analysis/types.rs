//! Evaluation record produced for one code sample.
//!
//! Every field has a zero/empty default so downstream consumers never have to
//! distinguish "missing" from "nothing found".

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of security findings kept on the record.
pub const MAX_REPORTED_ISSUES: usize = 5;

/// Classes with more methods than this are reported as god classes.
pub const GOD_CLASS_METHOD_LIMIT: usize = 10;

/// Methods spanning more lines than this are reported as long methods.
pub const LONG_METHOD_LINE_LIMIT: usize = 50;

/// Structured facts about one code sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRecord {
    /// Gate for every other field. When false, the rest stays at defaults.
    pub syntax_ok: bool,
    /// Parser diagnostic when `syntax_ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_error: Option<String>,
    pub function_count: usize,
    pub has_docstrings: bool,
    /// Mean cyclomatic complexity over all functions; 0 when there are none.
    pub avg_complexity: f64,
    pub security: SecurityFindings,
    pub error_handling: ErrorHandlingFacts,
    pub structure: StructureFacts,
    pub tests: TestFacts,
    pub maintainability: MaintainabilityFacts,
}

impl EvaluationRecord {
    /// Record for source that failed to parse.
    pub fn syntax_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            syntax_ok: false,
            syntax_error: Some(diagnostic.into()),
            ..Self::default()
        }
    }
}

/// Severity or confidence level reported by the security scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[default]
    Undefined,
    Low,
    Medium,
    High,
}

impl Level {
    /// Lenient parse; anything unrecognised maps to `Undefined`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::Undefined,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "UNDEFINED"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A single scanner finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIssue {
    pub severity: Level,
    pub confidence: Level,
    pub message: String,
    pub line: usize,
}

/// Security slice of the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityFindings {
    pub issue_count: usize,
    pub high_severity_count: usize,
    /// First findings in scanner order, at most [`MAX_REPORTED_ISSUES`].
    pub issues: Vec<SecurityIssue>,
    /// Set when the scan could not run. Zero issues then means "unknown".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SecurityFindings {
    pub fn from_issues(issues: Vec<SecurityIssue>) -> Self {
        let issue_count = issues.len();
        let high_severity_count = issues
            .iter()
            .filter(|issue| issue.severity == Level::High)
            .count();
        let mut issues = issues;
        issues.truncate(MAX_REPORTED_ISSUES);

        Self {
            issue_count,
            high_severity_count,
            issues,
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when the scan actually completed.
    pub fn is_verified(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingFacts {
    pub has_try_except: bool,
    pub has_custom_exceptions: bool,
    pub has_logging: bool,
    pub exception_block_count: usize,
    pub bare_except_count: usize,
    pub has_validation: bool,
}

/// Class-level structure facts (single-responsibility heuristics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureFacts {
    pub class_count: usize,
    pub avg_methods_per_class: f64,
    pub god_classes: BTreeSet<String>,
    /// `Class.method` names.
    pub long_methods: BTreeSet<String>,
    /// 0..=100, 100 when there are no classes.
    pub srp_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestFacts {
    pub has_tests: bool,
    pub test_function_count: usize,
    pub assertion_count: usize,
    pub frameworks: BTreeSet<String>,
}

/// Qualitative band of the maintainability index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintainabilityRating {
    Good,
    Moderate,
    DifficultToMaintain,
    #[default]
    Critical,
}

impl MaintainabilityRating {
    pub fn from_index(index: f64) -> Self {
        if index >= 80.0 {
            Self::Good
        } else if index >= 60.0 {
            Self::Moderate
        } else if index >= 20.0 {
            Self::DifficultToMaintain
        } else {
            Self::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::DifficultToMaintain => "Difficult to maintain",
            Self::Critical => "Critical - Very difficult to maintain",
        }
    }
}

impl fmt::Display for MaintainabilityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintainabilityFacts {
    pub index: f64,
    pub halstead_volume: f64,
    pub logical_loc: usize,
    pub comment_lines: usize,
    pub rating: MaintainabilityRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MaintainabilityFacts {
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
