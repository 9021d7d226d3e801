//! Independent extractors, each filling one slice of the evaluation record.
//!
//! The AST-based extractors take an already parsed module and cannot fail.
//! The tool-backed ones ([`metrics`], [`security`]) sit behind traits so the
//! evaluator can swap implementations and degrade on error.

pub mod basics;
pub mod error_handling;
pub mod metrics;
pub mod security;
pub mod structure;
pub mod test_coverage;

pub use basics::{extract_basics, BasicFacts};
pub use error_handling::extract_error_handling;
pub use metrics::{CodeMetrics, FunctionComplexity, MetricsError, MetricsTool, NativeMetrics};
pub use security::{
    run_scan, BanditScanner, DisabledScanner, ScanError, SecurityScanner, DEFAULT_SCAN_TIMEOUT,
};
pub use structure::extract_structure;
pub use test_coverage::extract_test_coverage;
