use clap::Parser;
use log::LevelFilter;

use pyrefine::app::App;
use pyrefine::cancel;
use pyrefine::cli::Cli;
use pyrefine::config::RefineConfig;
use pyrefine::features::Features;
use pyrefine::llm::{LlmConfig, LlmProvider};

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    // Initialize feature flags from environment, then apply CLI overrides
    let features = Features::from_env().with_overrides(cli.features.as_deref());
    Features::init_global(features);

    // Build LLM config from environment, then apply CLI overrides
    let provider = match cli.llm.provider.as_deref().map(str::parse::<LlmProvider>) {
        Some(Ok(provider)) => Some(provider),
        Some(Err(e)) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
        None => None,
    };
    let llm_config = LlmConfig::from_env().with_overrides(provider, cli.llm.model.clone());

    cancel::register_handler();

    let app = App::from_config(&llm_config, RefineConfig::from_env());
    match app.run(cli.command) {
        Ok(report) => println!("{}", report),
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    }
}
