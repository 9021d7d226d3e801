use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::features::Feature;
use crate::report::OutputFormat;

/// Input argument meaning "read from stdin".
pub const STDIN_INPUT: &str = "-";

/// Command line interface definition for pyrefine.
#[derive(Parser, Debug)]
#[command(name = "pyrefine")]
#[command(about = "Score Python code for production readiness and refine it with an LLM")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Enable optional features (comma separated)
    #[arg(long, value_enum, value_delimiter = ',', global = true)]
    pub features: Option<Vec<Feature>>,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Provider selection, from flags or `PYREFINE_LLM_PROVIDER` / `PYREFINE_LLM_MODEL`.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// LLM provider: groq, claude or none
    #[arg(long = "llm-provider", env = "PYREFINE_LLM_PROVIDER", global = true)]
    pub provider: Option<String>,

    /// Model to use instead of the default fallback chain
    #[arg(long = "llm-model", env = "PYREFINE_LLM_MODEL", global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyse and score a Python file
    Evaluate(EvaluateArgs),
    /// Generate Python code for a task, optionally refining it
    Generate(GenerateArgs),
    /// Refine existing Python code
    Improve(ImproveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Python file to evaluate, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: String,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// What the code should do
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Apply recommendations and refine the generated code
    #[arg(long)]
    pub refine: bool,

    #[command(flatten)]
    pub save: SaveArgs,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ImproveArgs {
    /// Python file to improve, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: String,

    /// Description of what the code is meant to do
    #[arg(long, default_value = "Improve this code")]
    pub task: String,

    #[command(flatten)]
    pub save: SaveArgs,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

/// Refinement limit and output files shared by `generate` and `improve`.
#[derive(Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Maximum refinement iterations (default 8, or PYREFINE_MAX_ITERATIONS)
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Write the final code to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write Markdown documentation to this file
    #[arg(long, value_name = "FILE")]
    pub doc: Option<PathBuf>,
}
