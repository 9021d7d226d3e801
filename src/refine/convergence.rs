//! When to stop refining.

use crate::config::{RefineConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_PLATEAU_THRESHOLD};
use crate::scoring::MAX_SCORE;

/// Why the policy stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    ScoreCeiling,
    MaxIterations,
    Plateau,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Continue { reason: String },
    Stop { reason: String, cause: StopCause },
}

impl Decision {
    pub fn should_continue(&self) -> bool {
        matches!(self, Decision::Continue { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Decision::Continue { reason } | Decision::Stop { reason, .. } => reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergencePolicy {
    pub max_iterations: u32,
    pub plateau_threshold: f64,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            plateau_threshold: DEFAULT_PLATEAU_THRESHOLD,
        }
    }
}

impl From<&RefineConfig> for ConvergencePolicy {
    fn from(config: &RefineConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            plateau_threshold: config.plateau_threshold,
        }
    }
}

impl ConvergencePolicy {
    /// Decide whether iteration `iteration` (1-based) should request another
    /// improvement. `previous` holds the scores of earlier iterations, oldest
    /// first, and excludes `current`.
    pub fn decide(&self, current: f64, previous: &[f64], iteration: u32) -> Decision {
        if current >= f64::from(MAX_SCORE) {
            return Decision::Stop {
                reason: format!("Perfect score achieved ({}/{})", current, MAX_SCORE),
                cause: StopCause::ScoreCeiling,
            };
        }

        if iteration >= self.max_iterations {
            return Decision::Stop {
                reason: format!("Maximum iterations ({}) reached", self.max_iterations),
                cause: StopCause::MaxIterations,
            };
        }

        if previous.len() >= 2 {
            if let Some(last) = previous.last() {
                let gain = current - last;
                if gain < self.plateau_threshold {
                    return Decision::Stop {
                        reason: format!(
                            "Minimal improvement detected ({} points). Convergence plateau reached.",
                            round1(gain)
                        ),
                        cause: StopCause::Plateau,
                    };
                }
            }
        }

        let reason = if current >= 90.0 {
            format!("Continue refinement to reach exceptional quality from {}/100", current)
        } else if current >= 85.0 {
            format!("Continue refinement to exceed production-ready from {}/100", current)
        } else {
            format!("Continue refinement to improve from {}/100", current)
        };
        Decision::Continue { reason }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// [`ConvergencePolicy::decide`] with explicit limits.
pub fn should_continue(current: f64, previous: &[f64], iteration: u32, max_iterations: u32) -> Decision {
    ConvergencePolicy {
        max_iterations,
        ..ConvergencePolicy::default()
    }
    .decide(current, previous, iteration)
}
