pub mod analysis;
pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod features;
pub mod generation;
pub mod llm;
pub mod process;
pub mod recommend;
pub mod refine;
pub mod report;
pub mod scoring;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
