//! Iterative improvement of Python code.
//!
//! Each iteration scores the current code, asks the [`ConvergencePolicy`]
//! whether to go on, and if so sends the recommendations to the provider.
//! A candidate replaces the current code only when its total score is
//! strictly higher; anything else ends the run. Provider failures end the
//! run too, keeping the last accepted code.

pub mod convergence;

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::analysis::{EvaluationRecord, Evaluator};
use crate::cancel;
use crate::config::RefineConfig;
use crate::generation::{build_improvement_prompt, CodeGenerator};
use crate::recommend::recommend;
use crate::scoring::{Rating, ScoreRecord, Scorer};
pub use convergence::{should_continue, ConvergencePolicy, Decision, StopCause};

/// One row of the refinement log, appended once per iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub iteration: u32,
    pub score: u32,
    pub rating: Rating,
    pub reason: String,
    pub recommendation_count: usize,
}

/// Why a refinement run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum StopReason {
    ScoreCeiling,
    MaxIterations,
    Plateau,
    /// The candidate did not beat the current score.
    NoImprovement,
    ProviderError(String),
    Cancelled,
    ProviderUnavailable,
    /// Refinement was not requested.
    Skipped,
}

impl From<StopCause> for StopReason {
    fn from(cause: StopCause) -> Self {
        match cause {
            StopCause::ScoreCeiling => StopReason::ScoreCeiling,
            StopCause::MaxIterations => StopReason::MaxIterations,
            StopCause::Plateau => StopReason::Plateau,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ScoreCeiling => write!(f, "perfect score reached"),
            StopReason::MaxIterations => write!(f, "iteration limit reached"),
            StopReason::Plateau => write!(f, "score plateaued"),
            StopReason::NoImprovement => write!(f, "candidate did not improve the score"),
            StopReason::ProviderError(e) => write!(f, "provider error: {}", e),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::ProviderUnavailable => write!(f, "no provider configured"),
            StopReason::Skipped => write!(f, "refinement not requested"),
        }
    }
}

/// Code together with its analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub code: String,
    pub evaluation: EvaluationRecord,
    pub score: ScoreRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementOutcome {
    pub code: String,
    pub evaluation: EvaluationRecord,
    pub score: ScoreRecord,
    pub iterations: u32,
    pub history: Vec<HistoryEntry>,
    pub stop_reason: StopReason,
}

impl RefinementOutcome {
    /// Outcome for code that was not refined.
    pub fn unrefined(candidate: Candidate) -> Self {
        Self {
            code: candidate.code,
            evaluation: candidate.evaluation,
            score: candidate.score,
            iterations: 0,
            history: Vec::new(),
            stop_reason: StopReason::Skipped,
        }
    }
}

/// Result of improving existing code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementSummary {
    pub original_code: String,
    pub improved_code: String,
    pub original_evaluation: EvaluationRecord,
    pub original_score: ScoreRecord,
    pub final_evaluation: EvaluationRecord,
    pub final_score: ScoreRecord,
    pub iterations: u32,
    pub history: Vec<HistoryEntry>,
    pub stop_reason: StopReason,
    /// Recommendations for the original code.
    pub recommendations_applied: Vec<String>,
    /// Recommendations still open for the improved code.
    pub recommendations: Vec<String>,
}

impl ImprovementSummary {
    pub fn delta(&self) -> i64 {
        i64::from(self.final_score.total) - i64::from(self.original_score.total)
    }
}

pub struct Refiner {
    evaluator: Evaluator,
    generator: CodeGenerator,
    scorer: Scorer,
    policy: ConvergencePolicy,
}

impl Refiner {
    pub fn new(evaluator: Evaluator, generator: CodeGenerator) -> Self {
        Self {
            evaluator,
            generator,
            scorer: Scorer::default(),
            policy: ConvergencePolicy::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(self, config: &RefineConfig) -> Self {
        self.with_policy(ConvergencePolicy::from(config))
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Evaluate and score `code`.
    pub fn assess(&self, code: &str) -> Candidate {
        let evaluation = self.evaluator.evaluate(code);
        let score = self.scorer.score(&evaluation);
        Candidate {
            code: code.to_string(),
            evaluation,
            score,
        }
    }

    /// Refine `code` until the policy stops, a candidate fails to improve,
    /// or the provider fails. `evaluation` is the analysis of `code`.
    pub fn refine(&self, task: &str, code: &str, evaluation: EvaluationRecord) -> RefinementOutcome {
        let mut current_code = code.to_string();
        let mut current_eval = evaluation;
        let mut history = Vec::new();
        let mut scores: Vec<f64> = Vec::new();
        let mut iteration = 0;

        let stop_reason = if !self.generator.is_available() {
            info!("No LLM provider configured, skipping refinement");
            StopReason::ProviderUnavailable
        } else if self.policy.max_iterations == 0 {
            StopReason::MaxIterations
        } else {
            loop {
                iteration += 1;

                let score = self.scorer.score(&current_eval);
                let current = f64::from(score.total);
                let decision = self.policy.decide(current, &scores, iteration);
                scores.push(current);

                let recommendations = recommend(&current_eval);
                history.push(HistoryEntry {
                    iteration,
                    score: score.total,
                    rating: score.rating,
                    reason: decision.reason().to_string(),
                    recommendation_count: recommendations.len(),
                });

                info!(
                    "Iteration {}: score {}/{} ({})",
                    iteration, score.total, score.max, score.rating
                );
                info!("  {}", decision.reason());
                info!("  Recommendations to apply: {}", recommendations.len());

                if let Decision::Stop { cause, .. } = decision {
                    break cause.into();
                }

                if cancel::is_cancelled() {
                    warn!("Refinement cancelled");
                    break StopReason::Cancelled;
                }

                let prompt = build_improvement_prompt(
                    task,
                    &current_code,
                    &current_eval,
                    &score,
                    &recommendations,
                );

                let improved = match self.generator.improve(&prompt) {
                    Ok(code) => code,
                    Err(e) => {
                        warn!("Refinement failed: {}", e);
                        break StopReason::ProviderError(e.to_string());
                    }
                };

                debug!("Re-evaluating candidate ({} bytes)", improved.len());
                let new_eval = self.evaluator.evaluate(&improved);
                let new_score = self.scorer.score(&new_eval);

                if new_score.total > score.total {
                    info!(
                        "  Score improved: {} -> {} (+{})",
                        score.total,
                        new_score.total,
                        new_score.total - score.total
                    );
                    current_code = improved;
                    current_eval = new_eval;
                } else {
                    info!(
                        "  No improvement ({} -> {}), stopping refinement",
                        score.total, new_score.total
                    );
                    break StopReason::NoImprovement;
                }
            }
        };

        info!("Refinement complete: {} iteration(s), {}", iteration, stop_reason);

        let score = self.scorer.score(&current_eval);
        RefinementOutcome {
            code: current_code,
            evaluation: current_eval,
            score,
            iterations: iteration,
            history,
            stop_reason,
        }
    }

    /// Ask the provider once to apply the current recommendations.
    ///
    /// Returns the analysed candidate regardless of its score, or `None`
    /// when there is nothing to apply, no provider, or the call failed.
    pub fn apply_once(&self, task: &str, code: &str, evaluation: &EvaluationRecord) -> Option<Candidate> {
        if !self.generator.is_available() {
            info!("No LLM provider configured, skipping recommendations pass");
            return None;
        }

        let recommendations = recommend(evaluation);
        if recommendations.is_empty() {
            return None;
        }

        if cancel::is_cancelled() {
            return None;
        }

        info!("Applying {} recommendation(s) once", recommendations.len());
        let score = self.scorer.score(evaluation);
        let prompt = build_improvement_prompt(task, code, evaluation, &score, &recommendations);

        match self.generator.improve(&prompt) {
            Ok(improved) => Some(self.assess(&improved)),
            Err(e) => {
                warn!("Failed to apply recommendations: {}", e);
                None
            }
        }
    }

    /// Generate code for `task`, apply the recommendations once, then refine.
    pub fn generate(&self, task: &str) -> RefinementOutcome {
        let initial = self.assess(&self.generator.generate(task));
        info!(
            "Initial score: {}/{} ({})",
            initial.score.total, initial.score.max, initial.score.rating
        );

        let start = match self.apply_once(task, &initial.code, &initial.evaluation) {
            Some(candidate) if candidate.score.total > initial.score.total => {
                info!(
                    "Applying recommendations improved score: {} -> {}",
                    initial.score.total, candidate.score.total
                );
                candidate
            }
            Some(candidate) => {
                info!(
                    "Applying recommendations did not improve the score ({} -> {}), keeping the initial code",
                    initial.score.total, candidate.score.total
                );
                initial
            }
            None => initial,
        };

        self.refine(task, &start.code, start.evaluation)
    }

    /// Refine existing code and summarise the change.
    pub fn improve(&self, task: &str, code: &str) -> ImprovementSummary {
        let original = self.assess(code);
        let recommendations_applied = recommend(&original.evaluation);
        info!(
            "Original score: {}/{} with {} recommendation(s)",
            original.score.total,
            original.score.max,
            recommendations_applied.len()
        );

        let outcome = self.refine(task, code, original.evaluation.clone());
        let recommendations = recommend(&outcome.evaluation);

        ImprovementSummary {
            original_code: original.code,
            improved_code: outcome.code,
            original_evaluation: original.evaluation,
            original_score: original.score,
            final_evaluation: outcome.evaluation,
            final_score: outcome.score,
            iterations: outcome.iterations,
            history: outcome.history,
            stop_reason: outcome.stop_reason,
            recommendations_applied,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indoc::indoc;

    use super::*;
    use crate::llm::test_support::{MockLlmClient, ScriptedLlmClient};
    use crate::llm::LlmError;

    const PLAIN: &str = "def add(a, b):\n    return a + b\n";

    const DOCUMENTED: &str = indoc! {r#"
        import logging


        def add(a, b):
            """Add two numbers."""
            try:
                return a + b
            except TypeError:
                logging.error("bad input")
                raise
    "#};

    fn refiner(responses: Vec<Result<String, LlmError>>) -> (Refiner, Arc<ScriptedLlmClient>) {
        let client = Arc::new(ScriptedLlmClient::new(responses));
        let generator = CodeGenerator::new(client.clone(), vec!["m".to_string()]);
        (Refiner::new(Evaluator::offline(), generator), client)
    }

    #[test]
    fn test_no_provider_returns_input() {
        let refiner = Refiner::new(Evaluator::offline(), CodeGenerator::offline());
        let evaluation = refiner.evaluator().evaluate(PLAIN);
        let outcome = refiner.refine("add", PLAIN, evaluation.clone());

        assert_eq!(outcome.code, PLAIN);
        assert_eq!(outcome.evaluation, evaluation);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.history.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::ProviderUnavailable);
    }

    #[test]
    fn test_accepts_better_code_then_stops_without_improvement() {
        let (refiner, client) = refiner(vec![
            Ok(format!("```python\n{}```", DOCUMENTED)),
            Ok(PLAIN.to_string()),
        ]);
        let evaluation = refiner.evaluator().evaluate(PLAIN);
        let outcome = refiner.refine("add", PLAIN, evaluation);

        assert_eq!(outcome.code, DOCUMENTED.trim_end());
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.stop_reason, StopReason::NoImprovement);
        assert_eq!(client.calls().len(), 2);
        assert!(outcome.history[1].score > outcome.history[0].score);
        assert_eq!(outcome.history[0].iteration, 1);
    }

    #[test]
    fn test_provider_error_keeps_current_code() {
        let (refiner, _) = refiner(vec![Err(LlmError::Timeout("slow".to_string()))]);
        let evaluation = refiner.evaluator().evaluate(PLAIN);
        let outcome = refiner.refine("add", PLAIN, evaluation);

        assert_eq!(outcome.code, PLAIN);
        assert_eq!(outcome.iterations, 1);
        assert!(matches!(outcome.stop_reason, StopReason::ProviderError(_)));
    }

    #[test]
    fn test_iteration_limit_bounds_provider_calls() {
        let client = Arc::new(MockLlmClient::new(DOCUMENTED));
        let refiner = Refiner::new(
            Evaluator::offline(),
            CodeGenerator::new(client, Vec::new()),
        )
        .with_policy(ConvergencePolicy {
            max_iterations: 1,
            plateau_threshold: 1.0,
        });
        let evaluation = refiner.evaluator().evaluate(PLAIN);
        let outcome = refiner.refine("add", PLAIN, evaluation);

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.stop_reason, StopReason::MaxIterations);
        assert_eq!(outcome.code, PLAIN);
    }

    #[test]
    fn test_apply_once_returns_candidate() {
        let (refiner, client) = refiner(vec![Ok(DOCUMENTED.to_string())]);
        let evaluation = refiner.evaluator().evaluate(PLAIN);
        let candidate = refiner.apply_once("add", PLAIN, &evaluation).unwrap();

        assert!(candidate.evaluation.has_docstrings);
        assert!(client.calls()[0].user.contains("RECOMMENDATIONS TO APPLY:"));
    }

    #[test]
    fn test_improve_summary() {
        let (refiner, _) = refiner(vec![Ok(DOCUMENTED.to_string())]);
        let summary = refiner.improve("add", PLAIN);

        assert_eq!(summary.original_code, PLAIN);
        assert!(summary.delta() > 0);
        assert!(!summary.recommendations_applied.is_empty());
        assert!(matches!(summary.stop_reason, StopReason::ProviderError(_)));
    }

    #[test]
    fn test_stop_reason_serializes_with_detail() {
        let value = serde_json::to_value(StopReason::ProviderError("boom".to_string())).unwrap();
        assert_eq!(value["kind"], "provider_error");
        assert_eq!(value["detail"], "boom");
    }
}
