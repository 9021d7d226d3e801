//! Application layer: turns a parsed [`Command`] into a report.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::analysis::Evaluator;
use crate::cli::{Command, EvaluateArgs, GenerateArgs, ImproveArgs, SaveArgs, STDIN_INPUT};
use crate::config::RefineConfig;
use crate::generation::CodeGenerator;
use crate::llm::{LlmClient, LlmConfig};
use crate::recommend::recommend;
use crate::refine::{HistoryEntry, RefinementOutcome, Refiner};
use crate::report::{self, OutputFormat};
use crate::scoring::{ScoreRecord, Scorer};
use crate::utils::truncate;

/// Longest task text copied into the saved code header.
const HEADER_TASK_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No code to process: input is empty")]
    EmptyInput,
}

pub struct App {
    client: Option<Arc<dyn LlmClient>>,
    models: Vec<String>,
    config: RefineConfig,
    scorer: Scorer,
    offline_tools: bool,
}

impl App {
    pub fn new(client: Option<Arc<dyn LlmClient>>, models: Vec<String>, config: RefineConfig) -> Self {
        Self {
            client,
            models,
            config,
            scorer: Scorer::default(),
            offline_tools: false,
        }
    }

    /// Build from configuration. A provider that cannot be created is
    /// reported and treated as absent.
    pub fn from_config(llm_config: &LlmConfig, config: RefineConfig) -> Self {
        let client = match llm_config.create_client() {
            Ok(client) => client,
            Err(e) => {
                warn!("LLM provider unavailable, continuing without it: {}", e);
                None
            }
        };
        Self::new(client, llm_config.models(), config).with_scorer(Scorer::from_features())
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Skip external analysis tools.
    pub fn with_offline_tools(mut self) -> Self {
        self.offline_tools = true;
        self
    }

    /// Run a command and return the rendered report.
    pub fn run(&self, command: Command) -> Result<String, AppError> {
        match command {
            Command::Evaluate(args) => self.evaluate(args),
            Command::Generate(args) => self.generate(args),
            Command::Improve(args) => self.improve(args),
        }
    }

    fn refiner(&self, max_iterations: Option<u32>) -> Refiner {
        let config = self.config.clone().with_overrides(max_iterations);
        let evaluator = if self.offline_tools {
            Evaluator::offline()
        } else {
            Evaluator::from_config(&config)
        };
        let generator = match &self.client {
            Some(client) => CodeGenerator::new(Arc::clone(client), self.models.clone()),
            None => CodeGenerator::offline(),
        };
        Refiner::new(evaluator, generator)
            .with_scorer(self.scorer)
            .with_config(&config)
    }

    fn evaluate(&self, args: EvaluateArgs) -> Result<String, AppError> {
        let code = read_input(&args.input)?;
        let candidate = self.refiner(None).assess(&code);
        let recommendations = recommend(&candidate.evaluation);
        info!(
            "Score: {}/{} ({})",
            candidate.score.total, candidate.score.max, candidate.score.rating
        );
        Ok(report::format_evaluation(
            &candidate.evaluation,
            &candidate.score,
            &recommendations,
            args.format,
        ))
    }

    fn generate(&self, args: GenerateArgs) -> Result<String, AppError> {
        let refiner = self.refiner(args.save.max_iterations);

        let outcome = if args.refine {
            refiner.generate(&args.task)
        } else {
            let code = refiner.generator().generate(&args.task);
            RefinementOutcome::unrefined(refiner.assess(&code))
        };

        let recommendations = recommend(&outcome.evaluation);
        save_results(
            &args.save,
            &args.task,
            &outcome.code,
            &outcome.score,
            &outcome.history,
            || {
                report::render_documentation(
                    &args.task,
                    &outcome.code,
                    &outcome.evaluation,
                    &outcome.score,
                    &recommendations,
                    &outcome.history,
                )
            },
        )?;

        Ok(report::format_outcome(&args.task, &outcome, &recommendations, args.format))
    }

    fn improve(&self, args: ImproveArgs) -> Result<String, AppError> {
        let code = read_input(&args.input)?;
        if code.trim().is_empty() {
            return Err(AppError::EmptyInput);
        }

        let summary = self.refiner(args.save.max_iterations).improve(&args.task, &code);
        info!(
            "Improvement: {:+} points over {} iteration(s)",
            summary.delta(),
            summary.iterations
        );

        save_results(
            &args.save,
            &args.task,
            &summary.improved_code,
            &summary.final_score,
            &summary.history,
            || {
                report::render_documentation(
                    &args.task,
                    &summary.improved_code,
                    &summary.final_evaluation,
                    &summary.final_score,
                    &summary.recommendations,
                    &summary.history,
                )
            },
        )?;

        Ok(report::format_improvement(&args.task, &summary, args.format))
    }
}

fn read_input(input: &str) -> Result<String, AppError> {
    if input == STDIN_INPUT {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(AppError::Stdin)?;
        return Ok(buf);
    }
    fs::read_to_string(input).map_err(|source| AppError::Read {
        path: PathBuf::from(input),
        source,
    })
}

/// Final code prefixed with a short provenance header.
pub fn code_with_header(task: &str, code: &str, score: &ScoreRecord) -> String {
    format!(
        "# Auto-generated and refined code\n# Original prompt: {}\n# Production score: {}/{}\n\n{}\n",
        truncate(&task.replace('\n', " "), HEADER_TASK_LEN),
        score.total,
        score.max,
        code.trim_end()
    )
}

fn save_results(
    save: &SaveArgs,
    task: &str,
    code: &str,
    score: &ScoreRecord,
    history: &[HistoryEntry],
    documentation: impl FnOnce() -> String,
) -> Result<(), AppError> {
    if let Some(path) = &save.output {
        write_file(path, &code_with_header(task, code, score))?;
        info!("Code saved to {}", path.display());
    }
    if let Some(path) = &save.doc {
        write_file(path, &documentation())?;
        info!(
            "Documentation saved to {} ({} history entries)",
            path.display(),
            history.len()
        );
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    fs::write(path, contents).map_err(|source| AppError::Write {
        path: path.to_path_buf(),
        source,
    })
}
