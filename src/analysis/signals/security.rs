//! Security scanning through an external tool.
//!
//! The scanner runs out of process with a hard timeout. Any failure (missing
//! binary, timeout, unreadable report) is turned into an annotated empty
//! finding set by [`run_scan`] so evaluation always completes.

use std::io::Write;
use std::process::Command;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::analysis::types::{Level, SecurityFindings, SecurityIssue};
use crate::process::{self, ProcessError};
use crate::utils::{json_object_slice, truncate};

pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{0}")]
    ToolUnavailable(String),

    #[error("scanner timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed scanner output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessError> for ScanError {
    fn from(err: ProcessError) -> Self {
        Self::ToolUnavailable(err.to_string())
    }
}

/// Anything that can report security findings for a Python source string.
pub trait SecurityScanner: Send + Sync {
    fn scan(&self, source: &str) -> Result<Vec<SecurityIssue>, ScanError>;
}

/// Scan and fold errors into the findings instead of propagating them.
pub fn run_scan(scanner: &dyn SecurityScanner, source: &str) -> SecurityFindings {
    match scanner.scan(source) {
        Ok(issues) => {
            debug!("Security scan found {} issue(s)", issues.len());
            SecurityFindings::from_issues(issues)
        }
        Err(e) => {
            warn!("Security scan unavailable: {}", e);
            SecurityFindings::unavailable(format!("Security scan unavailable: {}", e))
        }
    }
}

/// Runs `bandit -f json` against a temporary copy of the source.
#[derive(Debug, Clone)]
pub struct BanditScanner {
    pub program: String,
    pub timeout: Duration,
}

impl BanditScanner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for BanditScanner {
    fn default() -> Self {
        Self::new("bandit", DEFAULT_SCAN_TIMEOUT)
    }
}

impl SecurityScanner for BanditScanner {
    fn scan(&self, source: &str) -> Result<Vec<SecurityIssue>, ScanError> {
        let mut temp_file = tempfile::Builder::new()
            .prefix("pyrefine-")
            .suffix(".py")
            .tempfile()?;
        temp_file.write_all(source.as_bytes())?;
        temp_file.flush()?;

        let output = process::run_with_timeout(
            Command::new(&self.program)
                .args(["-f", "json", "-q"])
                .arg(temp_file.path()),
            None,
            self.timeout,
        )?;

        if output.timed_out {
            return Err(ScanError::Timeout(self.timeout));
        }
        if !output.stderr.trim().is_empty() {
            debug!("{} stderr: {}", self.program, output.stderr.trim());
        }

        // bandit exits non-zero whenever it finds something; only the report matters
        parse_bandit_report(&output.stdout).map_err(|e| match e {
            ScanError::MalformedOutput(msg) if output.stdout.trim().is_empty() => {
                ScanError::MalformedOutput(format!(
                    "{} (stderr: {})",
                    msg,
                    truncate(output.stderr.trim(), 200)
                ))
            }
            other => other,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BanditReport {
    #[serde(default)]
    results: Vec<BanditResult>,
}

#[derive(Debug, Deserialize)]
struct BanditResult {
    #[serde(default)]
    issue_severity: String,
    #[serde(default)]
    issue_confidence: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    line_number: usize,
}

/// Parse bandit's JSON report, tolerating log noise around the object.
pub fn parse_bandit_report(stdout: &str) -> Result<Vec<SecurityIssue>, ScanError> {
    let json = json_object_slice(stdout)
        .ok_or_else(|| ScanError::MalformedOutput("no JSON report in output".to_string()))?;

    let report: BanditReport =
        serde_json::from_str(json).map_err(|e| ScanError::MalformedOutput(e.to_string()))?;

    Ok(report
        .results
        .into_iter()
        .map(|r| SecurityIssue {
            severity: Level::parse(&r.issue_severity),
            confidence: Level::parse(&r.issue_confidence),
            message: r.issue_text,
            line: r.line_number,
        })
        .collect())
}

/// Scanner that never runs anything, for offline use.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledScanner;

impl SecurityScanner for DisabledScanner {
    fn scan(&self, _source: &str) -> Result<Vec<SecurityIssue>, ScanError> {
        Err(ScanError::ToolUnavailable(
            "security scanning disabled".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"[main]  INFO    running on Python 3.11
{
  "errors": [],
  "results": [
    {
      "code": "3 subprocess.call(cmd, shell=True)\n",
      "issue_confidence": "HIGH",
      "issue_severity": "HIGH",
      "issue_text": "subprocess call with shell=True identified, security issue.",
      "line_number": 3,
      "test_id": "B602"
    },
    {
      "issue_confidence": "HIGH",
      "issue_severity": "LOW",
      "issue_text": "Consider possible security implications associated with the subprocess module.",
      "line_number": 1,
      "test_id": "B404"
    }
  ]
}"#;

    #[test]
    fn test_parse_report() {
        let issues = parse_bandit_report(REPORT).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Level::High);
        assert_eq!(issues[0].line, 3);
        assert_eq!(issues[1].severity, Level::Low);
        assert!(issues[1].message.contains("subprocess module"));
    }

    #[test]
    fn test_parse_empty_results() {
        assert!(parse_bandit_report(r#"{"results": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_bandit_report("Traceback (most recent call last):"),
            Err(ScanError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_bandit_report("{not json}"),
            Err(ScanError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_missing_binary_degrades() {
        let scanner = BanditScanner::new("pyrefine-no-such-bandit", Duration::from_secs(1));
        let findings = run_scan(&scanner, "x = 1\n");

        assert_eq!(findings.issue_count, 0);
        let error = findings.error.unwrap();
        assert!(error.starts_with("Security scan unavailable:"), "{}", error);
        assert!(error.contains("pyrefine-no-such-bandit"));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_without_report_is_malformed() {
        // `sh -f json ...` fails to open a script named "json" and prints nothing
        let scanner = BanditScanner::new("sh", Duration::from_secs(5));
        let err = scanner.scan("x = 1\n").unwrap_err();
        assert!(matches!(err, ScanError::MalformedOutput(_)), "{:?}", err);
    }

    #[test]
    fn test_disabled_scanner() {
        let findings = run_scan(&DisabledScanner, "x = 1\n");
        assert!(!findings.is_verified());
    }
}
