//! Refinement loop behavior against a scripted provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use indoc::indoc;

use pyrefine::analysis::Evaluator;
use pyrefine::generation::{CodeGenerator, FALLBACK_CODE};
use pyrefine::llm::{CompletionRequest, LlmClient, LlmError};
use pyrefine::refine::{should_continue, ConvergencePolicy, Decision, Refiner, StopCause, StopReason};

/// Replays queued responses and records the model of every call.
#[derive(Default)]
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    models: Mutex<Vec<Option<String>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            models: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.models.lock().unwrap().len()
    }
}

impl LlmClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        self.models
            .lock()
            .unwrap()
            .push(request.model.map(str::to_string));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ClientError("no more responses".to_string())))
    }
}

const BARE: &str = "def add(a, b):\n    return a + b\n";

const DOCUMENTED: &str = indoc! {r#"
    def add(a, b):
        """Add two numbers."""
        return a + b
"#};

const HARDENED: &str = indoc! {r#"
    import logging


    def add(a, b):
        """Add two numbers."""
        if not isinstance(a, int):
            raise TypeError("a must be an int")
        try:
            return a + b
        except TypeError:
            logging.error("bad input")
            raise
"#};

fn refiner(client: Arc<ScriptedClient>, max_iterations: u32) -> Refiner {
    let generator = CodeGenerator::new(client, vec!["primary".to_string(), "backup".to_string()]);
    Refiner::new(Evaluator::offline(), generator).with_policy(ConvergencePolicy {
        max_iterations,
        plateau_threshold: 1.0,
    })
}

fn run(refiner: &Refiner, code: &str) -> pyrefine::refine::RefinementOutcome {
    let evaluation = refiner.evaluator().evaluate(code);
    refiner.refine("add two numbers", code, evaluation)
}

#[test]
fn plateau_stops_before_the_iteration_limit() {
    let decision = should_continue(76.5, &[70.0, 76.0], 3, 8);
    assert!(matches!(
        decision,
        Decision::Stop {
            cause: StopCause::Plateau,
            ..
        }
    ));
}

#[test]
fn improving_candidates_are_accepted_until_one_is_not() {
    let client = ScriptedClient::new(vec![
        Ok(format!("```python\n{}```", DOCUMENTED)),
        Ok(HARDENED.to_string()),
        Ok(BARE.to_string()),
    ]);
    let refiner = refiner(client.clone(), 8);
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.code, HARDENED.trim_end());
    assert_eq!(outcome.stop_reason, StopReason::NoImprovement);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(client.call_count(), 3);

    let scores: Vec<u32> = outcome.history.iter().map(|h| h.score).collect();
    assert!(scores.windows(2).all(|w| w[0] < w[1]), "{:?}", scores);
    assert_eq!(outcome.score.total, *scores.last().unwrap());
    let iterations: Vec<u32> = outcome.history.iter().map(|h| h.iteration).collect();
    assert_eq!(iterations, vec![1, 2, 3]);
}

#[test]
fn iteration_limit_bounds_provider_calls() {
    let client = ScriptedClient::new(vec![
        Ok(DOCUMENTED.to_string()),
        Ok(HARDENED.to_string()),
    ]);
    let refiner = refiner(client.clone(), 2);
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.stop_reason, StopReason::MaxIterations);
    assert_eq!(client.call_count(), 1);
    assert_eq!(outcome.code, DOCUMENTED.trim_end());
}

#[test]
fn provider_failure_returns_last_accepted_code() {
    let client = ScriptedClient::new(vec![
        Ok(DOCUMENTED.to_string()),
        Err(LlmError::Http {
            status: 500,
            message: "upstream error".to_string(),
        }),
    ]);
    let refiner = refiner(client.clone(), 8);
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.code, DOCUMENTED.trim_end());
    assert_eq!(outcome.iterations, 2);
    assert!(matches!(outcome.stop_reason, StopReason::ProviderError(ref e) if e.contains("500")));
    assert_eq!(client.call_count(), 2);
}

#[test]
fn rate_limit_falls_back_to_next_model() {
    let client = ScriptedClient::new(vec![
        Err(LlmError::RateLimited("tokens per minute".to_string())),
        Ok(DOCUMENTED.to_string()),
    ]);
    let refiner = refiner(client.clone(), 2);
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.code, DOCUMENTED.trim_end());
    let models = client.models.lock().unwrap().clone();
    assert_eq!(
        models,
        vec![Some("primary".to_string()), Some("backup".to_string())]
    );
}

#[test]
fn without_a_provider_nothing_changes() {
    let refiner = Refiner::new(Evaluator::offline(), CodeGenerator::offline());
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.code, BARE);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.stop_reason, StopReason::ProviderUnavailable);

    assert_eq!(refiner.generator().generate("anything"), FALLBACK_CODE);
}

#[test]
fn improve_reports_the_delta() {
    let client = ScriptedClient::new(vec![Ok(HARDENED.to_string()), Ok(BARE.to_string())]);
    let summary = refiner(client, 8).improve("add two numbers", BARE);

    assert_eq!(summary.original_code, BARE);
    assert_eq!(summary.improved_code, HARDENED.trim_end());
    assert!(summary.delta() > 0);
    assert!(summary.recommendations_applied.len() > summary.recommendations.len());
    assert_eq!(summary.stop_reason, StopReason::NoImprovement);
}

#[test]
fn small_gains_end_the_loop_on_a_plateau() {
    let client = ScriptedClient::new(vec![
        Ok(DOCUMENTED.to_string()),
        Ok(HARDENED.to_string()),
        Ok(BARE.to_string()),
    ]);
    let generator = CodeGenerator::new(client.clone(), vec!["primary".to_string()]);
    let refiner = Refiner::new(Evaluator::offline(), generator).with_policy(ConvergencePolicy {
        max_iterations: 8,
        plateau_threshold: 50.0,
    });
    let outcome = run(&refiner, BARE);

    assert_eq!(outcome.stop_reason, StopReason::Plateau);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(client.call_count(), 2);
    assert_eq!(outcome.code, HARDENED.trim_end());

    let scores: Vec<u32> = outcome.history.iter().map(|h| h.score).collect();
    assert_eq!(scores.len(), 3);
    assert!(scores[0] < scores[1] && scores[1] < scores[2], "{:?}", scores);
    assert!(f64::from(scores[2] - scores[1]) < 50.0);
    assert_eq!(outcome.score.total, scores[2]);
    assert!(outcome.history[2]
        .reason
        .starts_with("Minimal improvement detected"));
}
